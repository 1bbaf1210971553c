//! Randomized workloads replayed against every engine and a `std` collection.

use quickcheck::{Arbitrary, Gen};

mod map;
mod sets;

/// An enum for the various kinds of "things" to do to
/// a tree in a quicktest.
#[derive(Copy, Clone, Debug)]
pub enum Op<K, V> {
    /// Insert the K, V into the tree
    Insert(K, V),
    /// Erase the K from the tree
    Erase(K),
    /// Look the K up
    Contains(K),
}

impl<K, V> Arbitrary for Op<K, V>
where
    K: Arbitrary,
    V: Arbitrary,
{
    /// Tells quickcheck how to randomly choose an operation
    fn arbitrary(g: &mut Gen) -> Self {
        match g.choose(&[0, 1, 2]).unwrap() {
            0 => Op::Insert(K::arbitrary(g), V::arbitrary(g)),
            1 => Op::Erase(K::arbitrary(g)),
            2 => Op::Contains(K::arbitrary(g)),
            _ => unreachable!(),
        }
    }
}
