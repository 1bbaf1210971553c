//! A red-black tree that inserts top-down and erases bottom-up.
//!
//! Top-down insertion never walks back up; bottom-up erasure only rotates where the black-height
//! deficit actually is. Both halves work on the same node layout with parent links, which
//! insertion keeps up to date for the benefit of erasure.
//!
//! # Examples
//!
//! ```
//! use balanced_bst::HyRbTree;
//!
//! let mut tree = HyRbTree::new();
//! for key in (0..64).rev() {
//!     tree.insert(key);
//! }
//! for key in 0..32 {
//!     tree.erase(&key);
//! }
//!
//! assert_eq!(tree.keys(), (32..64).collect::<Vec<_>>());
//! assert!(tree.validate().is_ok());
//! ```

use std::fmt;

use super::{bottom_up, forward_to_core, top_down, RbCore, Rotations};
use crate::config::{Config, Replacement};
use crate::error::InvariantError;

/// A red-black tree with top-down insertion and bottom-up erasure.
#[derive(Clone)]
pub struct HyRbTree<K> {
    core: RbCore<K>,
    rotations: Rotations,
}

impl<K> Default for HyRbTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for HyRbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_keys(f)
    }
}

impl<K> HyRbTree<K> {
    /// Creates an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty tree. Parent links are always kept and a node with two children is
    /// always replaced by its successor; `freed_list` is honored.
    pub fn with_config(config: Config) -> Self {
        Self {
            core: RbCore::new(&config, true, false),
            rotations: Rotations::default(),
        }
    }

    /// Inserts `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        top_down::insert(&mut self.core, key, &mut self.rotations)
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn erase(&mut self, key: &K) -> bool
    where
        K: Ord,
    {
        bottom_up::erase(
            &mut self.core,
            key,
            Replacement::Successor,
            &mut self.rotations,
        )
    }

    /// Checks key order, the red-black rules, the parent links, and the key count.
    pub fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        self.core.validate(false)
    }

    forward_to_core!(Rotations);
}

delegate_balanced_tree!(HyRbTree);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::rb_height_bound;

    #[test]
    fn insertion_rotations_count_by_direction() {
        let mut tree = HyRbTree::new();
        for key in [3, 1, 2] {
            tree.insert(key);
        }
        // The double rotation is a left rotation at 1 and a right rotation at 3.
        assert_eq!(
            tree.rotations,
            Rotations {
                rotate_left: 1,
                rotate_right: 1
            }
        );
        tree.validate().unwrap();
    }

    #[test]
    fn top_down_insertion_keeps_parent_links() {
        let mut tree = HyRbTree::new();
        for key in 0..256 {
            tree.insert(key);
        }
        tree.validate().unwrap();
        assert!(tree.height() <= rb_height_bound(tree.len()));
    }

    #[test]
    fn erase_uses_the_successor() {
        let mut tree = HyRbTree::new();
        for key in [2, 1, 3] {
            tree.insert(key);
        }
        assert!(tree.erase(&2));
        assert_eq!(tree.core.arena[tree.core.root.unwrap()].key, 3);
        tree.validate().unwrap();
    }

    #[test]
    fn mixed_workload() {
        let mut tree = HyRbTree::new();
        for round in 0..4 {
            for key in (round..400).step_by(4) {
                assert!(tree.insert(key));
            }
            for key in (0..400).step_by(7) {
                tree.erase(&key);
                tree.validate().unwrap();
            }
        }
        let expected: Vec<_> = (0..400).filter(|key| key % 7 != 0).collect();
        assert_eq!(tree.keys(), expected);
    }
}
