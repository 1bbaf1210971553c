//! Sedgewick's left-leaning red-black tree.
//!
//! A red link may only lean left, which leaves fewer cases to handle: insert and erase recurse
//! down the tree and restore the invariants with the same three local fixes on the way back up.
//!
//! # Examples
//!
//! ```
//! use balanced_bst::LlRbTree;
//!
//! let mut tree = LlRbTree::new();
//! for key in [4, 2, 6, 1, 3, 5, 7] {
//!     tree.insert(key);
//! }
//!
//! assert_eq!(tree.min(), Some(&1));
//! assert_eq!(tree.max(), Some(&7));
//!
//! assert!(tree.delete_min());
//! assert!(tree.erase(&4));
//! assert_eq!(tree.keys(), vec![2, 3, 5, 6, 7]);
//! assert!(tree.validate().is_ok());
//! ```

use std::cmp::Ordering;
use std::fmt;

use super::{forward_to_core, RbCore, RbNode, Rotations};
use crate::arena::{Link, NodeId};
use crate::config::Config;
use crate::error::InvariantError;
use crate::util::{Color, Side};

/// A left-leaning red-black tree.
///
/// Erasing a node with two children always takes the in-order successor, whatever
/// [`Config::replacement`] says: pulling the predecessor up would leave a red link on the right.
/// The replacement policy only decides whether subtree sizes are kept.
#[derive(Clone)]
pub struct LlRbTree<K> {
    core: RbCore<K>,
    rotations: Rotations,
}

impl<K> Default for LlRbTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for LlRbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_keys(f)
    }
}

impl<K> LlRbTree<K> {
    /// Creates an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty tree. Parent links are never kept; `freed_list` is honored.
    pub fn with_config(config: Config) -> Self {
        Self {
            core: RbCore::new(&config, false, config.replacement.needs_sizes()),
            rotations: Rotations::default(),
        }
    }

    /// Inserts `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        let (root, inserted) = self.insert_at(self.core.root, key);
        self.core.root = Some(root);
        self.core.blacken_root();
        if inserted {
            self.core.len += 1;
        }
        inserted
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn erase(&mut self, key: &K) -> bool
    where
        K: Ord,
    {
        if !self.contains(key) {
            return false;
        }
        let root = self.prepare_root();
        self.core.root = self.erase_at(root, key);
        self.finish_removal();
        true
    }

    /// The smallest key.
    pub fn min(&self) -> Option<&K> {
        let root = self.core.root?;
        Some(&self.core.arena[self.core.extreme(root, Side::Left)].key)
    }

    /// The largest key.
    pub fn max(&self) -> Option<&K> {
        let root = self.core.root?;
        Some(&self.core.arena[self.core.extreme(root, Side::Right)].key)
    }

    /// Removes the smallest key. Returns `false` if the tree was empty.
    pub fn delete_min(&mut self) -> bool {
        if self.core.root.is_none() {
            return false;
        }
        let root = self.prepare_root();
        self.core.root = self.delete_min_at(root).0;
        self.finish_removal();
        true
    }

    /// Removes the largest key. Returns `false` if the tree was empty.
    pub fn delete_max(&mut self) -> bool {
        if self.core.root.is_none() {
            return false;
        }
        let root = self.prepare_root();
        self.core.root = self.delete_max_at(root);
        self.finish_removal();
        true
    }

    /// Checks key order, the red-black rules including that no red link leans right, the cached
    /// subtree sizes when kept, and the key count.
    pub fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        self.core.validate(true)
    }

    forward_to_core!(Rotations);

    /// Colors the root red if both its children are black, so the descent starts on a red link.
    fn prepare_root(&mut self) -> NodeId {
        let root = self.core.root.expect("removal from an empty tree");
        if !self.core.is_red(self.core.child(root, Side::Left))
            && !self.core.is_red(self.core.child(root, Side::Right))
        {
            self.core.set_color(root, Color::Red);
        }
        root
    }

    fn finish_removal(&mut self) {
        self.core.blacken_root();
        self.core.len -= 1;
    }

    /// Rotates `h` toward `side`. The lifted child inherits the color of `h`, which turns red.
    fn rotate(&mut self, h: NodeId, side: Side) -> NodeId {
        let color = self.core.arena[h].color;
        let x = self.core.rotate(h, side);
        self.core.set_color(x, color);
        self.core.set_color(h, Color::Red);
        match side {
            Side::Left => self.rotations.rotate_left += 1,
            Side::Right => self.rotations.rotate_right += 1,
        }
        x
    }

    /// Complements the colors of `h` and its two children, provided they differ from it.
    fn flip_colors(&mut self, h: NodeId) {
        let core = &mut self.core;
        let (Some(left), Some(right)) = (core.child(h, Side::Left), core.child(h, Side::Right))
        else {
            return;
        };
        let color = core.arena[h].color;
        if core.arena[left].color != color && core.arena[right].color != color {
            core.set_color(h, color.flipped());
            core.set_color(left, color);
            core.set_color(right, color);
        }
    }

    /// The three local fixes applied on the way back up.
    fn balance(&mut self, mut h: NodeId) -> NodeId {
        if self.core.is_red(self.core.child(h, Side::Right))
            && !self.core.is_red(self.core.child(h, Side::Left))
        {
            h = self.rotate(h, Side::Left);
        }
        let left = self.core.child(h, Side::Left);
        let outer = left.and_then(|left| self.core.child(left, Side::Left));
        if self.core.is_red(left) && self.core.is_red(outer) {
            h = self.rotate(h, Side::Right);
        }
        if self.core.is_red(self.core.child(h, Side::Left))
            && self.core.is_red(self.core.child(h, Side::Right))
        {
            self.flip_colors(h);
        }
        self.core.update_size(h);
        h
    }

    /// Makes the left child of `h` or one of its children red ahead of a descent to the left.
    fn move_red_left(&mut self, mut h: NodeId) -> NodeId {
        self.flip_colors(h);
        let right = self.core.child(h, Side::Right);
        if let Some(right) = right {
            if self.core.is_red(self.core.child(right, Side::Left)) {
                let lifted = self.rotate(right, Side::Right);
                self.core.set_child(h, Side::Right, Some(lifted));
                h = self.rotate(h, Side::Left);
                self.flip_colors(h);
            }
        }
        h
    }

    /// Makes the right child of `h` or one of its children red ahead of a descent to the right.
    fn move_red_right(&mut self, mut h: NodeId) -> NodeId {
        self.flip_colors(h);
        let left = self.core.child(h, Side::Left);
        if self.core.is_red(left.and_then(|l| self.core.child(l, Side::Left))) {
            h = self.rotate(h, Side::Right);
            self.flip_colors(h);
        }
        h
    }

    /// Whether the `side` child of `h` and that child's left child are both black, so a red link
    /// has to be moved down before descending toward `side`.
    fn needs_red(&self, h: NodeId, side: Side) -> bool {
        match self.core.child(h, side) {
            Some(child) => {
                let inner = self.core.child(child, Side::Left);
                !self.core.is_red(Some(child)) && !self.core.is_red(inner)
            }
            None => false,
        }
    }

    fn insert_at(&mut self, link: Link, key: K) -> (NodeId, bool)
    where
        K: Ord,
    {
        let Some(h) = link else {
            return (self.core.acquire(key), true);
        };
        let side = match key.cmp(&self.core.arena[h].key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return (h, false),
        };
        let below = self.core.child(h, side);
        let (child, inserted) = self.insert_at(below, key);
        self.core.set_child(h, side, Some(child));
        (self.balance(h), inserted)
    }

    fn erase_at(&mut self, mut h: NodeId, key: &K) -> Link
    where
        K: Ord,
    {
        if *key < self.core.arena[h].key {
            if self.needs_red(h, Side::Left) {
                h = self.move_red_left(h);
            }
            let left = self
                .core
                .child(h, Side::Left)
                .expect("a present smaller key lies to the left");
            let left = self.erase_at(left, key);
            self.core.set_child(h, Side::Left, left);
        } else {
            if self.core.is_red(self.core.child(h, Side::Left)) {
                h = self.rotate(h, Side::Right);
            }
            if *key == self.core.arena[h].key && self.core.child(h, Side::Right).is_none() {
                let left = self.core.child(h, Side::Left);
                self.core.arena.release(h);
                return left;
            }
            if self.needs_red(h, Side::Right) {
                h = self.move_red_right(h);
            }
            let right = self
                .core
                .child(h, Side::Right)
                .expect("a present larger key, or the successor, lies to the right");
            let right = if *key == self.core.arena[h].key {
                let (right, successor) = self.delete_min_at(right);
                self.core.arena[h].key = successor.key;
                right
            } else {
                self.erase_at(right, key)
            };
            self.core.set_child(h, Side::Right, right);
        }
        Some(self.balance(h))
    }

    /// Removes the smallest node below `h`, handing it back.
    fn delete_min_at(&mut self, mut h: NodeId) -> (Link, RbNode<K>) {
        let Some(mut left) = self.core.child(h, Side::Left) else {
            let right = self.core.child(h, Side::Right);
            return (right, self.core.arena.release(h));
        };
        if self.needs_red(h, Side::Left) {
            h = self.move_red_left(h);
            left = self
                .core
                .child(h, Side::Left)
                .expect("moving red left keeps the left child");
        }
        let (left, removed) = self.delete_min_at(left);
        self.core.set_child(h, Side::Left, left);
        (Some(self.balance(h)), removed)
    }

    fn delete_max_at(&mut self, mut h: NodeId) -> Link {
        if self.core.is_red(self.core.child(h, Side::Left)) {
            h = self.rotate(h, Side::Right);
        }
        if self.core.child(h, Side::Right).is_none() {
            let left = self.core.child(h, Side::Left);
            self.core.arena.release(h);
            return left;
        }
        if self.needs_red(h, Side::Right) {
            h = self.move_red_right(h);
        }
        let right = self
            .core
            .child(h, Side::Right)
            .expect("moving red right keeps the right child");
        let right = self.delete_max_at(right);
        self.core.set_child(h, Side::Right, right);
        Some(self.balance(h))
    }
}

delegate_balanced_tree!(LlRbTree);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Replacement;
    use crate::util::rb_height_bound;

    fn tree_of(keys: impl IntoIterator<Item = u32>) -> LlRbTree<u32> {
        let mut tree = LlRbTree::new();
        for key in keys {
            tree.insert(key);
        }
        tree
    }

    #[test]
    fn ascending_inserts_lean_left() {
        let mut tree = LlRbTree::new();
        tree.insert(1);
        tree.insert(2);
        // 2 is a red right child until the rotation puts 1 on its left.
        assert_eq!(tree.rotations.rotate_left, 1);
        let root = tree.core.root.unwrap();
        assert_eq!(tree.core.arena[root].key, 2);
        assert!(tree.core.is_red(tree.core.child(root, Side::Left)));
        tree.validate().unwrap();
    }

    #[test]
    fn descending_inserts_split() {
        let tree = tree_of([3, 2, 1]);
        assert_eq!(
            tree.rotations,
            Rotations {
                rotate_left: 0,
                rotate_right: 1
            }
        );
        let root = tree.core.root.unwrap();
        assert_eq!(tree.core.arena[root].key, 2);
        // The color flip leaves both children black.
        assert!(!tree.core.is_red(tree.core.child(root, Side::Left)));
        assert!(!tree.core.is_red(tree.core.child(root, Side::Right)));
        tree.validate().unwrap();
    }

    #[test]
    fn duplicate_insert() {
        let mut tree = tree_of([2, 1, 3]);
        assert!(!tree.insert(2));
        assert_eq!(tree.len(), 3);
        tree.validate().unwrap();
    }

    #[test]
    fn erase_takes_the_successor() {
        let mut tree = tree_of(1..=7);
        let root = tree.core.root.unwrap();
        assert_eq!(tree.core.arena[root].key, 4);

        assert!(tree.erase(&4));
        assert!(!tree.contains(&4));
        assert_eq!(tree.keys(), vec![1, 2, 3, 5, 6, 7]);
        tree.validate().unwrap();
    }

    #[test]
    fn erase_missing_key() {
        let mut tree = tree_of([1, 2, 3]);
        assert!(!tree.erase(&4));
        assert_eq!(tree.len(), 3);

        let mut empty = LlRbTree::<u32>::new();
        assert!(!empty.erase(&1));
    }

    #[test]
    fn erase_everything() {
        for order in [
            (0..128).collect::<Vec<_>>(),
            (0..128).rev().collect(),
            (0..128).map(|key| (key * 37) % 128).collect(),
        ] {
            let mut tree = tree_of(0..128);
            for key in &order {
                assert!(tree.erase(key));
                tree.validate().unwrap();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.freed_len(), 128);
        }
    }

    #[test]
    fn min_max() {
        let tree = tree_of([5, 3, 8, 1]);
        assert_eq!(tree.min(), Some(&1));
        assert_eq!(tree.max(), Some(&8));

        let empty = LlRbTree::<u32>::new();
        assert_eq!(empty.min(), None);
        assert_eq!(empty.max(), None);
    }

    #[test]
    fn delete_min_and_max() {
        let mut tree = tree_of(0..64);
        for expected in 0..16 {
            assert_eq!(tree.min(), Some(&expected));
            assert!(tree.delete_min());
            tree.validate().unwrap();
        }
        for expected in (48..64).rev() {
            assert_eq!(tree.max(), Some(&expected));
            assert!(tree.delete_max());
            tree.validate().unwrap();
        }
        assert_eq!(tree.keys(), (16..48).collect::<Vec<_>>());

        let mut empty = LlRbTree::<u32>::new();
        assert!(!empty.delete_min());
        assert!(!empty.delete_max());
    }

    #[test]
    fn predecessor_policies_still_take_the_successor() {
        for replacement in [Replacement::Preferred, Replacement::Inverted] {
            let mut tree = LlRbTree::with_config(Config::default().with_replacement(replacement));
            for key in 1..=7 {
                tree.insert(key);
            }
            assert!(tree.core.sizes);
            assert!(tree.erase(&4));
            assert_eq!(tree.keys(), vec![1, 2, 3, 5, 6, 7]);
            // The validator checks the cached sizes as well.
            tree.validate().unwrap();
        }
    }

    #[test]
    fn parent_links_are_never_kept() {
        let tree = LlRbTree::<u32>::with_config(Config::default().with_parent_links(true));
        assert!(!tree.core.parents);
    }

    #[test]
    fn height_stays_bounded() {
        let tree = tree_of(0..4096);
        assert!(tree.height() <= rb_height_bound(tree.len()));
        tree.validate().unwrap();
    }

    #[test]
    fn debug_lists_keys() {
        let tree = tree_of([2, 1]);
        assert_eq!(format!("{tree:?}"), "{1, 2}");
    }
}
