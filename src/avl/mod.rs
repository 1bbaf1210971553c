//! AVL trees: every node stores the height difference of its subtrees, kept in `-1..=1`.
//!
//! [`AvlMap`] is the engine; [`AvlTree`] is the same engine with no values attached.
//!
//! # Examples
//!
//! ```
//! use balanced_bst::AvlMap;
//!
//! let mut map = AvlMap::new();
//!
//! // Nothing in here yet.
//! assert_eq!(map.find(&1), None);
//!
//! assert!(map.insert(1, 2));
//! assert_eq!(map.find(&1), Some(&2));
//!
//! // Inserting a new value for the same key overwrites the value.
//! assert!(!map.insert(1, 3));
//! assert_eq!(map.find(&1), Some(&3));
//!
//! // Removing a key returns its value.
//! assert_eq!(map.remove(&1), Some(3));
//! assert_eq!(map.find(&1), None);
//! ```

mod set;

pub use set::AvlTree;

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use log::trace;

use crate::arena::{Arena, Branch, Link, NodeId};
use crate::config::{Config, Replacement};
use crate::error::InvariantError;
use crate::util::Side;
use crate::validate;

/// Rotation counters of the AVL engines.
///
/// The first letter is the side of the subtree that grew (insert) or that the replacement comes
/// from (erase), the second the side of the grandchild; `i` counts insertions and `e` erasures.
/// A double rotation (`lr`, `rl`) counts once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AvlRotations {
    /// Single right rotations after the left subtree of a left child grew.
    pub lli: u64,
    /// Double rotations after the right subtree of a left child grew.
    pub lri: u64,
    /// Double rotations after the left subtree of a right child grew.
    pub rli: u64,
    /// Single left rotations after the right subtree of a right child grew.
    pub rri: u64,
    /// Single right rotations after an erase left the left subtree too tall.
    pub lle: u64,
    /// Double rotations after an erase left the left subtree too tall.
    pub lre: u64,
    /// Double rotations after an erase left the right subtree too tall.
    pub rle: u64,
    /// Single left rotations after an erase left the right subtree too tall.
    pub rre: u64,
}

impl AvlRotations {
    /// Single rotations performed during insertion, with each double counted as two.
    pub fn insert_total(&self) -> u64 {
        self.lli + 2 * (self.lri + self.rli) + self.rri
    }

    /// Single rotations performed during erasure, with each double counted as two.
    pub fn erase_total(&self) -> u64 {
        self.lle + 2 * (self.lre + self.rle) + self.rre
    }

    /// Every counter, by name.
    pub fn counts(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("lli", self.lli),
            ("lri", self.lri),
            ("rli", self.rli),
            ("rri", self.rri),
            ("lle", self.lle),
            ("lre", self.lre),
            ("rle", self.rle),
            ("rre", self.rre),
        ]
    }

    fn record_insert(&mut self, grew: Side, double: bool) {
        let counter = match (grew, double) {
            (Side::Left, false) => &mut self.lli,
            (Side::Left, true) => &mut self.lri,
            (Side::Right, true) => &mut self.rli,
            (Side::Right, false) => &mut self.rri,
        };
        *counter += 1;
    }

    fn record_erase(&mut self, heavy: Side, double: bool) {
        let counter = match (heavy, double) {
            (Side::Left, false) => &mut self.lle,
            (Side::Left, true) => &mut self.lre,
            (Side::Right, true) => &mut self.rle,
            (Side::Right, false) => &mut self.rre,
        };
        *counter += 1;
    }
}

#[derive(Clone)]
pub(crate) struct AvlNode<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// `height(right) - height(left)`.
    pub(crate) bal: i8,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) parent: Link,
}

impl<K, V> AvlNode<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            bal: 0,
            left: None,
            right: None,
            parent: None,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl<K, V> Branch for AvlNode<K, V> {
    fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn links_mut(&mut self) -> [&mut Link; 3] {
        [&mut self.left, &mut self.right, &mut self.parent]
    }
}

/// The balance factor a node has when its `side` subtree is the taller one.
fn lean(side: Side) -> i8 {
    match side {
        Side::Left => -1,
        Side::Right => 1,
    }
}

/// A balance factor outside `-1..=1` means the tree was corrupted; nothing sensible can be done.
fn corrupt_balance(bal: i8) -> ! {
    panic!("AVL balance factor {} out of range", bal)
}

/// What an insertion did to the subtree it went into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Inserted {
    /// A node was added and the subtree is one level taller.
    Taller,
    /// A node was added and the height did not change.
    Absorbed,
    /// The key was present; its value was overwritten.
    Replaced,
}

/// The value an erase took out, and whether the subtree it came from got shorter.
struct Removed<V> {
    value: V,
    shorter: bool,
}

/// A key-value map kept balanced as an AVL tree.
#[derive(Clone)]
pub struct AvlMap<K, V> {
    arena: Arena<AvlNode<K, V>>,
    root: Link,
    len: usize,
    config: Config,
    rotations: AvlRotations,
}

impl<K, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for AvlMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        self.arena.in_order(self.root, |node| {
            map.entry(&node.key, &node.value);
        });
        map.finish()
    }
}

impl<K, V> AvlMap<K, V> {
    /// Creates an empty map with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty map. `parent_links`, `replacement` and `freed_list` are honored.
    pub fn with_config(config: Config) -> Self {
        Self {
            arena: Arena::new(config.storage, config.freed_list),
            root: None,
            len: 0,
            config,
            rotations: AvlRotations::default(),
        }
    }

    /// Number of entries in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every entry. Their nodes move to the freed list.
    pub fn clear(&mut self) {
        self.arena.release_all();
        self.root = None;
        self.len = 0;
    }

    /// Drops every node on the freed list.
    pub fn clear_freed(&mut self) {
        self.arena.clear_freed(&mut self.root);
    }

    /// Makes sure at least `n` nodes wait on the freed list, so the next `n` insertions do not
    /// allocate.
    pub fn preallocate(&mut self, n: usize) {
        self.arena.preallocate(n);
    }

    /// Number of nodes on the freed list.
    pub fn freed_len(&self) -> usize {
        self.arena.freed_len()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.arena.height(self.root)
    }

    /// Size in bytes of one node.
    pub fn node_size(&self) -> usize {
        mem::size_of::<AvlNode<K, V>>()
    }

    /// The rotation counters.
    pub fn rotations(&self) -> &AvlRotations {
        &self.rotations
    }

    /// The rotation counters, for resetting between measurements.
    pub fn rotations_mut(&mut self) -> &mut AvlRotations {
        &mut self.rotations
    }

    /// Appends every key, in ascending order, to `out`.
    pub fn extract_keys_in_order(&self, out: &mut Vec<K>)
    where
        K: Clone,
    {
        self.arena.in_order(self.root, |node| out.push(node.key.clone()));
    }

    /// Every key in ascending order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.len);
        self.arena.in_order(self.root, |node| keys.push(node.key.clone()));
        keys
    }

    /// Checks key order, that every stored balance factor matches the subtree heights, the
    /// parent links when they are kept, and the entry count.
    pub fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        validate::avl(&self.arena, self.root, self.len, self.config.parent_links)
    }

    /// Finds the node holding `key`.
    fn search(&self, key: &K) -> Link
    where
        K: Ord,
    {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.arena[id];
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Whether `key` is in the map.
    pub fn contains(&self, key: &K) -> bool
    where
        K: Ord,
    {
        self.search(key).is_some()
    }

    /// The value stored for `key`.
    pub fn find(&self, key: &K) -> Option<&V>
    where
        K: Ord,
    {
        self.search(key).map(|id| &self.arena[id].value)
    }

    /// The value stored for `key`, mutably.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V>
    where
        K: Ord,
    {
        let id = self.search(key)?;
        Some(&mut self.arena[id].value)
    }

    /// Inserts `key` with `value`. If `key` was present its value is overwritten and `false` is
    /// returned.
    pub fn insert(&mut self, key: K, value: V) -> bool
    where
        K: Ord,
    {
        let (root, inserted) = self.insert_at(self.root, key, value);
        self.set_root(root);
        if inserted == Inserted::Replaced {
            false
        } else {
            self.len += 1;
            true
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V>
    where
        K: Ord,
    {
        let root = self.root?;
        let (root, removed) = self.erase_at(root, key);
        let removed = removed?;
        self.root = root;
        if let Some(root) = root {
            self.set_root(root);
        }
        self.len -= 1;
        Some(removed.value)
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn erase(&mut self, key: &K) -> bool
    where
        K: Ord,
    {
        self.remove(key).is_some()
    }

    fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
        self.arena[root].parent = None;
    }

    /// Writes `child` into the `side` slot of `parent`, keeping the parent link in step.
    fn set_child(&mut self, parent: NodeId, side: Side, child: Link) {
        *self.arena[parent].child_mut(side) = child;
        if let (true, Some(child)) = (self.config.parent_links, child) {
            self.arena[child].parent = Some(parent);
        }
    }

    /// Rotates `p` down toward `side`, returning the child that took its place.
    ///
    /// Rotating `p` toward the right:
    ///
    /// ```text
    ///         p            c
    ///        / \          / \
    ///       c   z  =>    x   p
    ///      / \              / \
    ///     x   y            y   z
    /// ```
    fn rotate(&mut self, p: NodeId, side: Side) -> NodeId {
        let c = self.arena[p]
            .child(side.opposite())
            .expect("rotation needs a child to lift");
        let inner = self.arena[c].child(side);
        self.set_child(p, side.opposite(), inner);
        self.set_child(c, side, Some(p));
        c
    }

    /// Rotates twice to lift the grandchild of `p` on the `side`-then-opposite path, returning
    /// it. The balance factors are left to the caller.
    fn rotate_double(&mut self, p: NodeId, side: Side) -> NodeId {
        let c = self.arena[p].child(side).expect("double rotation needs a child");
        let lifted = self.rotate(c, side);
        self.set_child(p, side, Some(lifted));
        self.rotate(p, side.opposite())
    }

    fn insert_at(&mut self, link: Link, key: K, value: V) -> (NodeId, Inserted)
    where
        K: Ord,
    {
        let Some(p) = link else {
            let id = self.arena.acquire(AvlNode::new(key, value));
            return (id, Inserted::Taller);
        };

        let side = match key.cmp(&self.arena[p].key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                self.arena[p].value = value;
                return (p, Inserted::Replaced);
            }
        };

        let below = self.arena[p].child(side);
        let (child, inserted) = self.insert_at(below, key, value);
        self.set_child(p, side, Some(child));
        match inserted {
            Inserted::Taller => match self.grew(p, side) {
                (p, true) => (p, Inserted::Taller),
                (p, false) => (p, Inserted::Absorbed),
            },
            other => (p, other),
        }
    }

    /// Rebalances `p` after its `side` subtree got one level taller. Returns the root of the
    /// subtree and whether the subtree as a whole got taller.
    fn grew(&mut self, p: NodeId, side: Side) -> (NodeId, bool) {
        let lean = lean(side);
        let bal = self.arena[p].bal;
        if bal == -lean {
            self.arena[p].bal = 0;
            return (p, false);
        }
        if bal == 0 {
            self.arena[p].bal = lean;
            return (p, true);
        }
        if bal != lean {
            corrupt_balance(bal);
        }

        let p1 = self.arena[p].child(side).expect("a taller side has a child");
        let top = if self.arena[p1].bal == lean {
            self.rotations.record_insert(side, false);
            let top = self.rotate(p, side.opposite());
            self.arena[p].bal = 0;
            top
        } else {
            self.rotations.record_insert(side, true);
            let p2 = self.arena[p1]
                .child(side.opposite())
                .expect("an inner-heavy child has an inner grandchild");
            let b2 = self.arena[p2].bal;
            let top = self.rotate_double(p, side);
            self.arena[p].bal = if b2 == lean { -lean } else { 0 };
            self.arena[p1].bal = if b2 == -lean { lean } else { 0 };
            top
        };
        self.arena[top].bal = 0;
        (top, false)
    }

    /// Rebalances `p` after its `side` subtree got one level shorter. Returns the root of the
    /// subtree and whether the subtree as a whole got shorter.
    fn shrank(&mut self, p: NodeId, side: Side) -> (NodeId, bool) {
        let lean = lean(side);
        let bal = self.arena[p].bal;
        if bal == lean {
            self.arena[p].bal = 0;
            return (p, true);
        }
        if bal == 0 {
            self.arena[p].bal = -lean;
            return (p, false);
        }
        if bal != -lean {
            corrupt_balance(bal);
        }

        let heavy = side.opposite();
        let p1 = self.arena[p].child(heavy).expect("a taller side has a child");
        let b1 = self.arena[p1].bal;
        if b1 != lean {
            self.rotations.record_erase(heavy, false);
            let top = self.rotate(p, side);
            if b1 == 0 {
                self.arena[p].bal = -lean;
                self.arena[p1].bal = lean;
                (top, false)
            } else {
                self.arena[p].bal = 0;
                self.arena[p1].bal = 0;
                (top, true)
            }
        } else {
            self.rotations.record_erase(heavy, true);
            let p2 = self.arena[p1]
                .child(side)
                .expect("an inner-heavy child has an inner grandchild");
            let b2 = self.arena[p2].bal;
            let top = self.rotate_double(p, heavy);
            self.arena[p].bal = if b2 == -lean { lean } else { 0 };
            self.arena[p1].bal = if b2 == lean { -lean } else { 0 };
            self.arena[top].bal = 0;
            (top, true)
        }
    }

    fn erase_at(&mut self, p: NodeId, key: &K) -> (Link, Option<Removed<V>>)
    where
        K: Ord,
    {
        let side = match key.cmp(&self.arena[p].key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => {
                let (link, removed) = self.erase_node(p);
                return (link, Some(removed));
            }
        };

        let Some(child) = self.arena[p].child(side) else {
            return (Some(p), None);
        };
        let (child, removed) = self.erase_at(child, key);
        self.set_child(p, side, child);
        match removed {
            Some(removed) => {
                let (p, removed) = self.after_removal(p, side, removed);
                (Some(p), Some(removed))
            }
            None => (Some(p), None),
        }
    }

    /// Takes `p` out of its subtree, returning what replaces it.
    fn erase_node(&mut self, p: NodeId) -> (Link, Removed<V>) {
        let (left, right) = (self.arena[p].left, self.arena[p].right);
        let (Some(left), Some(right)) = (left, right) else {
            let AvlNode { value, .. } = self.arena.release(p);
            let removed = Removed {
                value,
                shorter: true,
            };
            return (left.or(right), removed);
        };

        let (side, start) = if self.prefers_predecessor(p) {
            (Side::Left, left)
        } else {
            (Side::Right, right)
        };
        trace!("replacing a two-child node from its {} subtree", side);
        let (child, removed) = self.take_extreme(start, p, side.opposite());
        self.set_child(p, side, child);
        let (p, removed) = self.after_removal(p, side, removed);
        (Some(p), removed)
    }

    /// Removes the node furthest toward `toward` below `p`, moving its entry into `target` and
    /// the entry of `target` out.
    fn take_extreme(&mut self, p: NodeId, target: NodeId, toward: Side) -> (Link, Removed<V>) {
        if let Some(child) = self.arena[p].child(toward) {
            let (child, removed) = self.take_extreme(child, target, toward);
            self.set_child(p, toward, child);
            let (p, removed) = self.after_removal(p, toward, removed);
            return (Some(p), removed);
        }

        let (extreme, target) = self.arena.pair_mut(p, target);
        mem::swap(&mut extreme.key, &mut target.key);
        mem::swap(&mut extreme.value, &mut target.value);
        let rest = self.arena[p].child(toward.opposite());
        let AvlNode { value, .. } = self.arena.release(p);
        let removed = Removed {
            value,
            shorter: true,
        };
        (rest, removed)
    }

    /// Rebalances `p` if the removal below its `side` subtree shortened it.
    fn after_removal(
        &mut self,
        p: NodeId,
        side: Side,
        mut removed: Removed<V>,
    ) -> (NodeId, Removed<V>) {
        if !removed.shorter {
            return (p, removed);
        }
        let (p, shorter) = self.shrank(p, side);
        removed.shorter = shorter;
        (p, removed)
    }

    fn prefers_predecessor(&self, p: NodeId) -> bool {
        let bal = self.arena[p].bal;
        match self.config.replacement {
            Replacement::Preferred => bal <= 0,
            Replacement::Inverted => bal < 0,
            Replacement::Successor | Replacement::ForcedSuccessor => false,
        }
    }
}
