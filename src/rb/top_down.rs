//! A red-black tree repaired top-down: insert and erase make a single pass from the root,
//! recoloring and rotating ahead of themselves so that nothing is left to fix once the leaf is
//! reached.
//!
//! The walk keeps its context in local variables instead of parent links: the current node, its
//! parent, grandparent and great-grandparent. An absent ancestor (`None`) stands for the slot
//! that holds the root.
//!
//! # Examples
//!
//! ```
//! use balanced_bst::TdRbTree;
//!
//! let mut tree = TdRbTree::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert(key);
//! }
//!
//! assert!(tree.erase(&5));
//! assert!(!tree.erase(&5));
//! assert_eq!(tree.keys(), vec![1, 3, 4, 7, 8, 9]);
//! assert!(tree.validate().is_ok());
//! ```

use std::cmp::Ordering;
use std::fmt;

use log::trace;

use super::{forward_to_core, RbCore, RotationLog, TdRotations};
use crate::arena::{Link, NodeId};
use crate::config::Config;
use crate::error::InvariantError;
use crate::util::{Color, Side};

/// The `side` link below `slot`, where `None` is the slot holding the root: the root hangs off
/// its right side.
fn below<K>(core: &RbCore<K>, slot: Link, side: Side) -> Link {
    match (slot, side) {
        (Some(id), side) => core.child(id, side),
        (None, Side::Right) => core.root,
        (None, Side::Left) => None,
    }
}

/// Makes `new` take the place of `old` below `slot`.
fn attach<K>(core: &mut RbCore<K>, slot: Link, old: NodeId, new: Link) {
    debug_assert!(
        below(core, slot, Side::Left) == Some(old) || below(core, slot, Side::Right) == Some(old),
        "the walk lost track of a parent"
    );
    core.replace_child(slot, old, new);
}

/// Rotates `x` toward `side`; `x` turns red and the lifted child black.
pub(crate) fn single<K>(
    core: &mut RbCore<K>,
    x: NodeId,
    side: Side,
    log: &mut impl RotationLog,
) -> NodeId {
    let lifted = core.rotate(x, side);
    core.set_color(x, Color::Red);
    core.set_color(lifted, Color::Black);
    log.single(side);
    lifted
}

/// Lifts the grandchild of `x` on the opposite-then-`side` path over `x`.
pub(crate) fn double<K>(
    core: &mut RbCore<K>,
    x: NodeId,
    side: Side,
    log: &mut impl RotationLog,
) -> NodeId {
    let child = core
        .child(x, side.opposite())
        .expect("a double rotation needs a child to lift");
    let lifted = single(core, child, side.opposite(), log);
    core.set_child(x, side.opposite(), Some(lifted));
    log.double();
    single(core, x, side, log)
}

/// The ancestors the insertion walk keeps track of.
#[derive(Clone, Copy)]
struct Ancestors {
    /// The slot the grandparent hangs from.
    great: Link,
    grand: Link,
    parent: Link,
    /// The side `parent` hangs off `grand`.
    last: Side,
}

impl Ancestors {
    /// Rotates at the grandparent if `node` and its parent are both red.
    fn repair<K>(self, core: &mut RbCore<K>, node: NodeId, log: &mut impl RotationLog) {
        let Some(parent) = self.parent else { return };
        if !core.is_red(Some(node)) || !core.is_red(Some(parent)) {
            return;
        }
        let grand = self.grand.expect("a red parent is never the root");
        let top = if core.child(parent, self.last) == Some(node) {
            single(core, grand, self.last.opposite(), log)
        } else {
            double(core, grand, self.last.opposite(), log)
        };
        attach(core, self.great, grand, Some(top));
    }
}

/// Inserts `key`, splitting every node with two red children on the way down. Returns `false`
/// if the key was already present.
pub(crate) fn insert<K: Ord>(core: &mut RbCore<K>, key: K, log: &mut impl RotationLog) -> bool {
    let Some(root) = core.root else {
        let node = core.acquire(key);
        core.set_color(node, Color::Black);
        core.root = Some(node);
        core.len += 1;
        return true;
    };

    let mut above = Ancestors {
        great: None,
        grand: None,
        parent: None,
        last: Side::Right,
    };
    let mut side = Side::Right;
    let mut node = root;
    loop {
        let left = core.child(node, Side::Left);
        let right = core.child(node, Side::Right);
        if let (Some(left), Some(right)) = (left, right) {
            if core.is_red(Some(left)) && core.is_red(Some(right)) {
                core.set_color(node, Color::Red);
                core.set_color(left, Color::Black);
                core.set_color(right, Color::Black);
            }
        }
        above.repair(core, node, log);

        let next = match key.cmp(&core.arena[node].key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                core.blacken_root();
                return false;
            }
        };
        above.last = side;
        side = next;
        // Stale for one level after a repair; the level right below a repair never needs one.
        above.great = above.grand;
        above.grand = above.parent;
        above.parent = Some(node);

        match core.child(node, side) {
            Some(child) => node = child,
            None => {
                let leaf = core.acquire(key);
                core.set_child(node, side, Some(leaf));
                core.len += 1;
                above.repair(core, leaf, log);
                core.blacken_root();
                return true;
            }
        }
    }
}

/// Erases `key` in one pass from the root, keeping the current node or one of its children red
/// so that the node finally removed is red. A node with two children takes its in-order
/// predecessor's key. Returns `false` if the key was not present.
pub(crate) fn erase<K: Ord>(core: &mut RbCore<K>, key: &K, log: &mut impl RotationLog) -> bool {
    if core.root.is_none() {
        return false;
    }

    let mut parent: Link = None;
    let mut current: Link = None;
    let mut found: Link = None;
    let mut side = Side::Right;

    while let Some(next) = below(core, current, side) {
        let last = side;
        let grand = parent;
        parent = current;
        current = Some(next);
        side = match key.cmp(&core.arena[next].key) {
            Ordering::Greater => Side::Right,
            Ordering::Less => Side::Left,
            Ordering::Equal => {
                found = Some(next);
                Side::Left
            }
        };

        if core.is_red(Some(next)) || core.is_red(core.child(next, side)) {
            continue;
        }

        if core.is_red(core.child(next, side.opposite())) {
            // A red child on the far side: rotate it up so the walk continues below a red node.
            let top = single(core, next, side, log);
            attach(core, parent, next, Some(top));
            parent = Some(top);
            continue;
        }

        let Some(sibling) = below(core, parent, last.opposite()) else {
            continue;
        };
        let parent_id = parent.expect("a node with a sibling has a parent");
        if !core.is_red(core.child(sibling, last.opposite()))
            && !core.is_red(core.child(sibling, last))
        {
            trace!("merging with a black sibling by color flip");
            core.set_color(parent_id, Color::Black);
            core.set_color(sibling, Color::Red);
            core.set_color(next, Color::Red);
        } else {
            let top = if core.is_red(core.child(sibling, last)) {
                double(core, parent_id, last, log)
            } else {
                single(core, parent_id, last, log)
            };
            attach(core, grand, parent_id, Some(top));

            core.set_color(next, Color::Red);
            core.set_color(top, Color::Red);
            for child_side in [Side::Left, Side::Right] {
                let child = core
                    .child(top, child_side)
                    .expect("a rotated-up node has two children");
                core.set_color(child, Color::Black);
            }
        }
    }

    let Some(target) = found else {
        core.blacken_root();
        return false;
    };
    let doomed = current.expect("the walk visited the target");
    core.swap_keys(target, doomed);
    let child = core
        .child(doomed, Side::Left)
        .or_else(|| core.child(doomed, Side::Right));
    attach(core, parent, doomed, child);
    if let Some(child) = child {
        core.set_color(child, Color::Black);
    }
    core.arena.release(doomed);
    core.len -= 1;
    core.blacken_root();
    true
}

/// A red-black tree repaired top-down in a single pass.
#[derive(Clone)]
pub struct TdRbTree<K> {
    core: RbCore<K>,
    rotations: TdRotations,
}

impl<K> Default for TdRbTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for TdRbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_keys(f)
    }
}

impl<K> TdRbTree<K> {
    /// Creates an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty tree. `parent_links` and `freed_list` are honored; a node with two
    /// children is always replaced by its predecessor.
    pub fn with_config(config: Config) -> Self {
        Self {
            core: RbCore::new(&config, config.parent_links, false),
            rotations: TdRotations::default(),
        }
    }

    /// Inserts `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        insert(&mut self.core, key, &mut self.rotations)
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn erase(&mut self, key: &K) -> bool
    where
        K: Ord,
    {
        erase(&mut self.core, key, &mut self.rotations)
    }

    /// Checks key order, the red-black rules, the parent links when kept, and the key count.
    pub fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        self.core.validate(false)
    }

    forward_to_core!(TdRotations);
}

delegate_balanced_tree!(TdRbTree);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::rb_height_bound;

    fn tree_of(keys: impl IntoIterator<Item = i32>) -> TdRbTree<i32> {
        let mut tree = TdRbTree::new();
        for key in keys {
            tree.insert(key);
            tree.validate().unwrap();
        }
        tree
    }

    fn root_key(tree: &TdRbTree<i32>) -> i32 {
        tree.core.arena[tree.core.root.unwrap()].key
    }

    #[test]
    fn outer_red_pair_takes_a_single_rotation() {
        let tree = tree_of([1, 2, 3]);
        assert_eq!(root_key(&tree), 2);
        assert_eq!(
            tree.rotations,
            TdRotations {
                single_rotations: 1,
                double_rotations: 0
            }
        );
    }

    #[test]
    fn inner_red_pair_takes_a_double_rotation() {
        let tree = tree_of([3, 1, 2]);
        assert_eq!(root_key(&tree), 2);
        assert_eq!(
            tree.rotations,
            TdRotations {
                single_rotations: 2,
                double_rotations: 1
            }
        );
    }

    #[test]
    fn split_on_the_way_down() {
        // 2 has two red children; inserting 4 splits it before descending.
        let tree = tree_of([2, 1, 3, 4]);
        assert_eq!(tree.rotations.single_rotations, 0);
        let root = tree.core.root.unwrap();
        assert_eq!(tree.core.arena[root].color, Color::Black);
        let three = tree.core.search(&3).unwrap();
        assert_eq!(tree.core.arena[three].color, Color::Black);
        let four = tree.core.search(&4).unwrap();
        assert_eq!(tree.core.arena[four].color, Color::Red);
    }

    #[test]
    fn duplicate_insert_keeps_the_tree_valid() {
        let mut tree = tree_of(0..32);
        assert!(!tree.insert(17));
        assert_eq!(tree.len(), 32);
        tree.validate().unwrap();
    }

    #[test]
    fn erase_uses_the_predecessor() {
        let mut tree = tree_of([2, 1, 3]);
        assert!(tree.erase(&2));
        assert_eq!(root_key(&tree), 1);
        assert_eq!(tree.keys(), vec![1, 3]);
        tree.validate().unwrap();
    }

    /// 2 over two black children, 1 and `sibling`; `sibling` has one red child, `nephew`.
    /// Erasing 1 has to borrow from the sibling on the way down.
    fn erase_next_to_red_nephew(sibling: i32, nephew: i32) -> TdRbTree<i32> {
        let mut core = RbCore::new(&Config::default(), false, false);
        let ids: Vec<NodeId> = [
            (1, Color::Black),
            (2, Color::Black),
            (sibling, Color::Black),
            (nephew, Color::Red),
        ]
        .into_iter()
        .map(|(key, color)| {
            let id = core.acquire(key);
            core.set_color(id, color);
            id
        })
        .collect();
        let side = if nephew < sibling { Side::Left } else { Side::Right };
        core.set_child(ids[2], side, Some(ids[3]));
        core.set_child(ids[1], Side::Left, Some(ids[0]));
        core.set_child(ids[1], Side::Right, Some(ids[2]));
        core.root = Some(ids[1]);
        core.len = 4;

        let mut tree = TdRbTree {
            core,
            rotations: TdRotations::default(),
        };
        tree.validate().unwrap();
        assert!(tree.erase(&1));
        tree.validate().unwrap();
        tree
    }

    #[test]
    fn erase_borrows_through_outer_red_nephew() {
        //     2              3
        //    / \            / \
        //   1   3     =>   2   4
        //        \
        //         4r
        let tree = erase_next_to_red_nephew(3, 4);
        assert_eq!(root_key(&tree), 3);
        assert_eq!(tree.keys(), vec![2, 3, 4]);
        assert_eq!(
            tree.rotations,
            TdRotations {
                single_rotations: 1,
                double_rotations: 0
            }
        );
    }

    #[test]
    fn erase_borrows_through_inner_red_nephew() {
        //     2              3
        //    / \            / \
        //   1   4     =>   2   4
        //      /
        //     3r
        let tree = erase_next_to_red_nephew(4, 3);
        assert_eq!(root_key(&tree), 3);
        assert_eq!(tree.keys(), vec![2, 3, 4]);
        assert_eq!(
            tree.rotations,
            TdRotations {
                single_rotations: 2,
                double_rotations: 1
            }
        );
    }

    #[test]
    fn erase_everything_in_every_order() {
        for step in [1, 3, 7] {
            let mut tree = tree_of(0..100);
            let mut keys: Vec<i32> = (0..100).collect();
            keys.sort_by_key(|key| (key * step) % 101);
            for key in &keys {
                assert!(tree.erase(key), "erasing {}", key);
                tree.validate().unwrap();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.freed_len(), 100);
        }
    }

    #[test]
    fn erase_missing_key() {
        let mut tree = tree_of(0..10);
        assert!(!tree.erase(&10));
        assert_eq!(tree.len(), 10);
        tree.validate().unwrap();

        let mut empty = TdRbTree::<i32>::new();
        assert!(!empty.erase(&1));
    }

    #[test]
    fn parent_links_when_asked_for() {
        let mut tree = TdRbTree::with_config(Config::default().with_parent_links(true));
        for key in 0..64 {
            tree.insert(key);
            tree.validate().unwrap();
        }
        for key in (0..64).rev() {
            tree.erase(&key);
            tree.validate().unwrap();
        }
    }

    #[test]
    fn height_stays_within_bound() {
        let tree = tree_of(0..5000);
        assert!(tree.height() <= rb_height_bound(tree.len()));
    }
}
