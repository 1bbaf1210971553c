use std::fmt;

use super::{AvlMap, AvlRotations};
use crate::config::Config;
use crate::error::InvariantError;

/// A set of keys kept balanced as an AVL tree.
///
/// # Examples
///
/// ```
/// use balanced_bst::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for key in [8, 9, 11, 15, 19, 20, 21, 7, 3, 2, 1] {
///     assert!(tree.insert(key));
/// }
///
/// // Keys are never stored twice.
/// assert!(!tree.insert(11));
/// assert_eq!(tree.len(), 11);
///
/// assert!(tree.erase(&11));
/// assert!(!tree.contains(&11));
/// assert!(tree.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct AvlTree<K> {
    map: AvlMap<K, ()>,
}

impl<K> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        self.map
            .arena
            .in_order(self.map.root, |node| {
                set.entry(&node.key);
            });
        set.finish()
    }
}

impl<K> AvlTree<K> {
    /// Creates an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty tree. `parent_links`, `replacement` and `freed_list` are honored.
    pub fn with_config(config: Config) -> Self {
        Self {
            map: AvlMap::with_config(config),
        }
    }

    /// Inserts `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        self.map.insert(key, ())
    }

    /// Whether `key` is in the tree.
    pub fn contains(&self, key: &K) -> bool
    where
        K: Ord,
    {
        self.map.contains(key)
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn erase(&mut self, key: &K) -> bool
    where
        K: Ord,
    {
        self.map.erase(key)
    }

    /// Number of keys in the tree.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes every key. Their nodes move to the freed list.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Drops every node on the freed list.
    pub fn clear_freed(&mut self) {
        self.map.clear_freed();
    }

    /// Makes sure at least `n` nodes wait on the freed list.
    pub fn preallocate(&mut self, n: usize) {
        self.map.preallocate(n);
    }

    /// Number of nodes on the freed list.
    pub fn freed_len(&self) -> usize {
        self.map.freed_len()
    }

    /// Appends every key, in ascending order, to `out`.
    pub fn extract_keys_in_order(&self, out: &mut Vec<K>)
    where
        K: Clone,
    {
        self.map.extract_keys_in_order(out);
    }

    /// Every key in ascending order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.map.keys()
    }

    /// Checks key order, the balance factors, the parent links when kept, and the key count.
    pub fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        self.map.validate()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.map.height()
    }

    /// Size in bytes of one node.
    pub fn node_size(&self) -> usize {
        self.map.node_size()
    }

    /// The rotation counters.
    pub fn rotations(&self) -> &AvlRotations {
        self.map.rotations()
    }

    /// The rotation counters, for resetting between measurements.
    pub fn rotations_mut(&mut self) -> &mut AvlRotations {
        self.map.rotations_mut()
    }
}

delegate_balanced_tree!(AvlTree);
