use balanced_bst::{AvlMap, Config};
use quickcheck_macros::quickcheck;

use std::collections::BTreeMap;

use crate::Op;

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8, i8>>) -> bool {
    let mut tree = AvlMap::with_config(Config::default().with_parent_links(true));
    let mut map = BTreeMap::new();
    for op in ops {
        let agree = match op {
            Op::Insert(k, v) => tree.insert(k, v) == map.insert(k, v).is_none(),
            Op::Erase(k) => tree.remove(&k) == map.remove(&k),
            Op::Contains(k) => tree.find(&k) == map.get(&k),
        };
        if !agree || tree.validate().is_err() {
            return false;
        }
    }

    map.iter().all(|(k, v)| tree.find(k) == Some(v)) && tree.len() == map.len()
}

#[quickcheck]
fn last_insert_wins(key: i8, values: Vec<i8>) -> bool {
    let mut tree = AvlMap::new();
    for v in &values {
        tree.insert(key, *v);
    }

    tree.find(&key) == values.last() && tree.len() == usize::from(!values.is_empty())
}
