//! This crate exposes several self-balancing Binary Search Trees (BSTs) behind one contract so
//! they can be compared head-to-head.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to insert, find, and delete
//! stored keys. Every node has at most two children, and the invariants that make it a BST are:
//!
//! 1. For every node, all the nodes in its left subtree have a smaller key.
//! 2. For every node, all the nodes in its right subtree have a larger key.
//!
//! Searching takes `O(height)`, so the trees here spend their effort keeping the height at
//! `O(lg N)`. They differ in how:
//!
//! - [`AvlTree`] and [`AvlMap`] store a balance factor in `-1..=1` per node and rotate as soon as
//!   one subtree gets two levels taller than its sibling.
//! - [`BuRbTree`] is a red-black tree that inserts and erases like an ordinary BST and then walks
//!   back up through parent links to repair the colors.
//! - [`TdRbTree`] is a red-black tree that repairs colors on the way down, in a single pass.
//! - [`HyRbTree`] inserts like [`TdRbTree`] and erases like [`BuRbTree`].
//! - [`LlRbTree`] is Sedgewick's left-leaning red-black tree.
//!
//! Every tree keeps its nodes in an arena owned by the tree and recycles erased nodes through a
//! freed list, counts the rotations it performs, and can check its own invariants with
//! `validate`.
//!
//! # Examples
//!
//! ```
//! use balanced_bst::{BalancedTree, BuRbTree, TdRbTree};
//!
//! fn fill<T: BalancedTree<u32>>(tree: &mut T) {
//!     for key in [5, 1, 4, 2, 3] {
//!         assert!(tree.insert(key));
//!     }
//!     assert!(!tree.insert(4));
//! }
//!
//! let mut bottom_up = BuRbTree::new();
//! let mut top_down = TdRbTree::new();
//! fill(&mut bottom_up);
//! fill(&mut top_down);
//!
//! assert_eq!(bottom_up.keys(), top_down.keys());
//! assert!(bottom_up.validate().is_ok());
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

/// Implements [`BalancedTree`] for an engine by forwarding to its inherent methods.
macro_rules! delegate_balanced_tree {
    ($tree:ident) => {
        impl<K: Ord> $crate::BalancedTree<K> for $tree<K> {
            fn insert(&mut self, key: K) -> bool {
                $tree::insert(self, key)
            }

            fn contains(&self, key: &K) -> bool {
                $tree::contains(self, key)
            }

            fn erase(&mut self, key: &K) -> bool {
                $tree::erase(self, key)
            }

            fn len(&self) -> usize {
                $tree::len(self)
            }

            fn clear(&mut self) {
                $tree::clear(self)
            }

            fn clear_freed(&mut self) {
                $tree::clear_freed(self)
            }

            fn preallocate(&mut self, n: usize) {
                $tree::preallocate(self, n)
            }

            fn freed_len(&self) -> usize {
                $tree::freed_len(self)
            }

            fn extract_keys_in_order(&self, out: &mut Vec<K>)
            where
                K: Clone,
            {
                $tree::extract_keys_in_order(self, out)
            }

            fn validate(&self) -> Result<(), $crate::InvariantError<K>>
            where
                K: Clone,
            {
                $tree::validate(self)
            }

            fn height(&self) -> usize {
                $tree::height(self)
            }

            fn rotation_counts(&self) -> Vec<(&'static str, u64)> {
                self.rotations().counts()
            }

            fn reset_rotations(&mut self) {
                *self.rotations_mut() = Default::default();
            }

            fn node_size(&self) -> usize {
                $tree::node_size(self)
            }
        }
    };
}

mod arena;
pub mod avl;
mod config;
pub mod dictionary;
mod error;
pub mod rb;
mod util;
mod validate;


pub use crate::avl::{AvlMap, AvlRotations, AvlTree};
pub use crate::config::{Config, Replacement, Storage};
pub use crate::error::InvariantError;
pub use crate::rb::{BuRbTree, HyRbTree, LlRbTree, Rotations, TdRbTree, TdRotations};
pub use crate::util::{Color, Side};

/// The operations every set-like tree in this crate supports.
///
/// The engines differ in how they rebalance; the trait is what benchmarks and tests program
/// against to compare them.
pub trait BalancedTree<K: Ord> {
    /// Inserts `key`. Returns `false`, leaving the tree's keys unchanged, if it was already
    /// present.
    fn insert(&mut self, key: K) -> bool;

    /// Whether `key` is in the tree.
    fn contains(&self, key: &K) -> bool;

    /// Removes `key`. Returns `false` if it was not present.
    fn erase(&mut self, key: &K) -> bool;

    /// Number of keys in the tree.
    fn len(&self) -> usize;

    /// Whether the tree holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every key. The nodes move to the freed list.
    fn clear(&mut self);

    /// Drops every node on the freed list.
    fn clear_freed(&mut self);

    /// Makes sure at least `n` nodes wait on the freed list.
    fn preallocate(&mut self, n: usize);

    /// Number of nodes on the freed list.
    fn freed_len(&self) -> usize;

    /// Appends every key, in ascending order, to `out`.
    fn extract_keys_in_order(&self, out: &mut Vec<K>)
    where
        K: Clone;

    /// Every key in ascending order.
    fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.len());
        self.extract_keys_in_order(&mut keys);
        keys
    }

    /// Checks every structural invariant of the tree, returning the first violation found.
    fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Clone;

    /// Number of nodes on the longest root-to-leaf path.
    fn height(&self) -> usize;

    /// The engine's rotation counters, by name.
    fn rotation_counts(&self) -> Vec<(&'static str, u64)>;

    /// Sets every rotation counter back to zero.
    fn reset_rotations(&mut self);

    /// Size in bytes of one node.
    fn node_size(&self) -> usize;
}
