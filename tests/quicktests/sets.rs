use balanced_bst::{
    AvlTree, BalancedTree, BuRbTree, Config, HyRbTree, LlRbTree, Replacement, Storage, TdRbTree,
};
use quickcheck_macros::quickcheck;

use std::collections::BTreeSet;

use crate::Op;

/// Applies `ops` to the tree and to a `BTreeSet`, checking after every step that both agree
/// and that the tree is still valid.
fn replay<T: BalancedTree<i8>>(mut tree: T, ops: &[Op<i8, ()>]) -> bool {
    let mut set = BTreeSet::new();
    for op in ops {
        let agree = match *op {
            Op::Insert(k, ()) => tree.insert(k) == set.insert(k),
            Op::Erase(k) => tree.erase(&k) == set.remove(&k),
            Op::Contains(k) => tree.contains(&k) == set.contains(&k),
        };
        if !agree || tree.len() != set.len() || tree.validate().is_err() {
            return false;
        }
    }
    tree.keys() == set.into_iter().collect::<Vec<_>>()
}

/// Inserts `xs` and erases them again; every node must end up on the freed list.
fn round_trip<T: BalancedTree<i16>>(mut tree: T, xs: &[i16]) -> bool {
    let distinct: BTreeSet<_> = xs.iter().copied().collect();
    for x in xs {
        tree.insert(*x);
    }
    for x in xs {
        tree.erase(x);
    }
    tree.is_empty() && tree.freed_len() == distinct.len() && tree.validate().is_ok()
}

/// Inserts `xs`, erases every other distinct key and gives the freed nodes back. The nodes left
/// behind get renumbered, so every link has to survive the move.
fn compact<T: BalancedTree<i16>>(mut tree: T, xs: &[i16]) -> bool {
    let distinct: Vec<_> = xs.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    for x in xs {
        tree.insert(*x);
    }
    for x in distinct.iter().step_by(2) {
        tree.erase(x);
    }
    tree.clear_freed();

    let kept: Vec<_> = distinct.iter().copied().skip(1).step_by(2).collect();
    if tree.freed_len() != 0 || tree.validate().is_err() || tree.keys() != kept {
        return false;
    }
    for x in distinct.iter().step_by(2) {
        tree.insert(*x);
    }
    tree.validate().is_ok() && tree.keys() == distinct
}

fn preferred() -> Config {
    Config::default().with_replacement(Replacement::Preferred)
}

#[quickcheck]
fn avl(ops: Vec<Op<i8, ()>>) -> bool {
    replay(AvlTree::new(), &ops)
        && replay(AvlTree::with_config(preferred().with_parent_links(true)), &ops)
}

#[quickcheck]
fn bottom_up(ops: Vec<Op<i8, ()>>) -> bool {
    [
        Replacement::Successor,
        Replacement::Preferred,
        Replacement::Inverted,
        Replacement::ForcedSuccessor,
    ]
    .into_iter()
    .all(|replacement| {
        let config = Config::default().with_replacement(replacement);
        replay(BuRbTree::with_config(config), &ops)
    })
}

#[quickcheck]
fn top_down(ops: Vec<Op<i8, ()>>) -> bool {
    replay(TdRbTree::new(), &ops)
        && replay(
            TdRbTree::with_config(Config::default().with_parent_links(true)),
            &ops,
        )
}

#[quickcheck]
fn hybrid(ops: Vec<Op<i8, ()>>) -> bool {
    replay(HyRbTree::new(), &ops)
}

#[quickcheck]
fn left_leaning(ops: Vec<Op<i8, ()>>) -> bool {
    replay(LlRbTree::new(), &ops) && replay(LlRbTree::with_config(preferred()), &ops)
}

#[quickcheck]
fn without_freed_list(ops: Vec<Op<i8, ()>>) -> bool {
    let config = Config::default().with_freed_list(false);
    replay(AvlTree::with_config(config), &ops)
        && replay(BuRbTree::with_config(config), &ops)
        && replay(TdRbTree::with_config(config), &ops)
        && replay(LlRbTree::with_config(config), &ops)
}

#[quickcheck]
fn freed_list_round_trip(xs: Vec<i16>) -> bool {
    round_trip(AvlTree::new(), &xs)
        && round_trip(BuRbTree::new(), &xs)
        && round_trip(TdRbTree::new(), &xs)
        && round_trip(HyRbTree::new(), &xs)
        && round_trip(LlRbTree::new(), &xs)
}

#[quickcheck]
fn clear_keeps_trees_valid(xs: Vec<i16>, ys: Vec<i16>) -> bool {
    let mut tree = BuRbTree::new();
    for x in &xs {
        tree.insert(*x);
    }
    tree.clear();
    if !tree.is_empty() || tree.validate().is_err() {
        return false;
    }
    for y in &ys {
        tree.insert(*y);
    }
    let expected: Vec<_> = ys.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    tree.validate().is_ok() && tree.keys() == expected
}

#[quickcheck]
fn boxed_storage(ops: Vec<Op<i8, ()>>) -> bool {
    let config = Config::default().with_storage(Storage::Boxed);
    replay(AvlTree::with_config(config), &ops)
        && replay(BuRbTree::with_config(config.with_replacement(Replacement::Preferred)), &ops)
        && replay(TdRbTree::with_config(config), &ops)
        && replay(HyRbTree::with_config(config), &ops)
        && replay(LlRbTree::with_config(config), &ops)
        && replay(AvlTree::with_config(config.with_freed_list(false)), &ops)
}

#[quickcheck]
fn clear_freed_keeps_links(xs: Vec<i16>) -> bool {
    [Storage::Contiguous, Storage::Boxed].into_iter().all(|storage| {
        let config = Config::default().with_storage(storage).with_parent_links(true);
        compact(AvlTree::with_config(config), &xs)
            && compact(BuRbTree::with_config(preferred().with_storage(storage)), &xs)
            && compact(TdRbTree::with_config(config), &xs)
            && compact(HyRbTree::with_config(config), &xs)
            && compact(LlRbTree::with_config(preferred().with_storage(storage)), &xs)
    })
}
