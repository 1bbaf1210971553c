//! Red-black trees.
//!
//! All four engines share one node layout and the primitives in this module; they differ in
//! where they repair the colors:
//!
//! - [`BuRbTree`]: on the way back up, through parent links.
//! - [`TdRbTree`]: on the way down, in a single pass.
//! - [`HyRbTree`]: down on insert, up on erase.
//! - [`LlRbTree`]: on the way back up a recursion, with red links allowed only on the left.

mod bottom_up;
mod hybrid;
mod left_leaning;
mod top_down;

pub use bottom_up::BuRbTree;
pub use hybrid::HyRbTree;
pub use left_leaning::LlRbTree;
pub use top_down::TdRbTree;

use std::mem;

use crate::arena::{Arena, Branch, Link, NodeId};
use crate::config::Config;
use crate::error::InvariantError;
use crate::util::{Color, Side};
use crate::validate;

/// Rotation counters of the bottom-up, hybrid and left-leaning engines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotations {
    /// Left rotations: the right child took its parent's place.
    pub rotate_left: u64,
    /// Right rotations: the left child took its parent's place.
    pub rotate_right: u64,
}

impl Rotations {
    /// Every rotation.
    pub fn total(&self) -> u64 {
        self.rotate_left + self.rotate_right
    }

    /// Every counter, by name.
    pub fn counts(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("rotate_left", self.rotate_left),
            ("rotate_right", self.rotate_right),
        ]
    }
}

/// Rotation counters of the top-down engine.
///
/// A double rotation is two single rotations; both of them are counted in `single_rotations`,
/// and the pair once more in `double_rotations`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TdRotations {
    /// Every single rotation, including the two halves of each double rotation.
    pub single_rotations: u64,
    /// Double rotations.
    pub double_rotations: u64,
}

impl TdRotations {
    /// Every counter, by name.
    pub fn counts(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("single_rotations", self.single_rotations),
            ("double_rotations", self.double_rotations),
        ]
    }
}

/// Where the rotation primitives report to, so the top-down and bottom-up halves can be shared
/// between engines with different counters.
pub(crate) trait RotationLog {
    /// One single rotation moving a node down toward `side`.
    fn single(&mut self, side: Side);

    /// A double rotation; its two halves are reported separately through `single`.
    fn double(&mut self) {}
}

impl RotationLog for Rotations {
    fn single(&mut self, side: Side) {
        match side {
            Side::Left => self.rotate_left += 1,
            Side::Right => self.rotate_right += 1,
        }
    }
}

impl RotationLog for TdRotations {
    fn single(&mut self, _side: Side) {
        self.single_rotations += 1;
    }

    fn double(&mut self) {
        self.double_rotations += 1;
    }
}

#[derive(Clone)]
pub(crate) struct RbNode<K> {
    pub(crate) key: K,
    pub(crate) color: Color,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) parent: Link,
    /// Nodes in the subtree rooted here; only kept up to date when the engine asks for it.
    pub(crate) size: usize,
}

impl<K> RbNode<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            color: Color::Red,
            left: None,
            right: None,
            parent: None,
            size: 1,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl<K> Branch for RbNode<K> {
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

/// The state every red-black engine carries: the arena, the root, the key count, and which of
/// the optional node fields are maintained.
#[derive(Clone)]
pub(crate) struct RbCore<K> {
    pub(crate) arena: Arena<RbNode<K>>,
    pub(crate) root: Link,
    pub(crate) len: usize,
    pub(crate) parents: bool,
    pub(crate) sizes: bool,
}

impl<K> RbCore<K> {
    pub(crate) fn new(config: &Config, parents: bool, sizes: bool) -> Self {
        Self {
            arena: Arena::new(config.storage, config.freed_list),
            root: None,
            len: 0,
            parents,
            sizes,
        }
    }

    /// The color of a link; an empty link is black.
    pub(crate) fn color(&self, link: Link) -> Color {
        link.map_or(Color::Black, |id| self.arena[id].color)
    }

    pub(crate) fn is_red(&self, link: Link) -> bool {
        self.color(link) == Color::Red
    }

    pub(crate) fn set_color(&mut self, id: NodeId, color: Color) {
        self.arena[id].color = color;
    }

    pub(crate) fn child(&self, id: NodeId, side: Side) -> Link {
        self.arena[id].child(side)
    }

    pub(crate) fn parent(&self, id: NodeId) -> Link {
        self.arena[id].parent
    }

    /// The cached size of a subtree; zero for an empty link.
    pub(crate) fn size(&self, link: Link) -> usize {
        link.map_or(0, |id| self.arena[id].size)
    }

    /// Recomputes the cached size of `id` from its children.
    pub(crate) fn update_size(&mut self, id: NodeId) {
        if self.sizes {
            let node = &self.arena[id];
            let size = 1 + self.size(node.left) + self.size(node.right);
            self.arena[id].size = size;
        }
    }

    /// Which child slot of `parent` holds `child`.
    pub(crate) fn side_of(&self, parent: NodeId, child: NodeId) -> Side {
        if self.child(parent, Side::Left) == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Writes `child` into the `side` slot of `parent`, keeping the parent link in step.
    pub(crate) fn set_child(&mut self, parent: NodeId, side: Side, child: Link) {
        *self.arena[parent].child_mut(side) = child;
        if let (true, Some(child)) = (self.parents, child) {
            self.arena[child].parent = Some(parent);
        }
    }

    /// Makes `new` take the place of `old` under `parent`, or at the root when `parent` is
    /// `None`.
    pub(crate) fn replace_child(&mut self, parent: Link, old: NodeId, new: Link) {
        match parent {
            Some(parent) => {
                let side = self.side_of(parent, old);
                self.set_child(parent, side, new);
            }
            None => {
                self.root = new;
                if let Some(new) = new {
                    self.arena[new].parent = None;
                }
            }
        }
    }

    /// Rotates `x` down toward `side` and returns the child that took its place. The caller
    /// reattaches the returned node; colors are untouched.
    ///
    /// Rotating `x` toward the left:
    ///
    /// ```text
    ///       x                y
    ///      / \              / \
    ///     a   y     =>     x   c
    ///        / \          / \
    ///       b   c        a   b
    /// ```
    pub(crate) fn rotate(&mut self, x: NodeId, side: Side) -> NodeId {
        let y = self
            .child(x, side.opposite())
            .expect("rotation needs a child to lift");
        let inner = self.child(y, side);
        self.set_child(x, side.opposite(), inner);
        self.set_child(y, side, Some(x));
        if self.sizes {
            self.arena[y].size = self.arena[x].size;
            self.update_size(x);
        }
        y
    }

    /// Rotates `x` toward `side` and reattaches the lifted child through `x`'s parent link.
    pub(crate) fn rotate_in_place(&mut self, x: NodeId, side: Side) -> NodeId {
        let parent = self.parent(x);
        let y = self.rotate(x, side);
        self.replace_child(parent, x, Some(y));
        y
    }

    /// The node furthest toward `side` in the subtree rooted at `id`.
    pub(crate) fn extreme(&self, mut id: NodeId, side: Side) -> NodeId {
        while let Some(next) = self.child(id, side) {
            id = next;
        }
        id
    }

    pub(crate) fn search(&self, key: &K) -> Link
    where
        K: Ord,
    {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.arena[id];
            cursor = match key.cmp(&node.key) {
                std::cmp::Ordering::Less => node.left,
                std::cmp::Ordering::Greater => node.right,
                std::cmp::Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Swaps the keys of two nodes.
    pub(crate) fn swap_keys(&mut self, a: NodeId, b: NodeId) {
        if a != b {
            let (a, b) = self.arena.pair_mut(a, b);
            mem::swap(&mut a.key, &mut b.key);
        }
    }

    /// Creates a red node for `key`.
    pub(crate) fn acquire(&mut self, key: K) -> NodeId {
        self.arena.acquire(RbNode::new(key))
    }

    /// Forces the root black.
    pub(crate) fn blacken_root(&mut self) {
        if let Some(root) = self.root {
            self.arena[root].color = Color::Black;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.arena.release_all();
        self.root = None;
        self.len = 0;
    }

    pub(crate) fn extract_keys_in_order(&self, out: &mut Vec<K>)
    where
        K: Clone,
    {
        self.arena.in_order(self.root, |node| out.push(node.key.clone()));
    }

    pub(crate) fn height(&self) -> usize {
        self.arena.height(self.root)
    }

    pub(crate) fn validate(&self, left_leaning: bool) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        validate::red_black(self, left_leaning)
    }

    pub(crate) fn fmt_keys(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    where
        K: std::fmt::Debug,
    {
        let mut set = f.debug_set();
        self.arena.in_order(self.root, |node| {
            set.entry(&node.key);
        });
        set.finish()
    }
}

/// Declares the inherent methods every red-black engine forwards to its [`RbCore`] unchanged.
macro_rules! forward_to_core {
    ($rotations:ty) => {
        /// Whether `key` is in the tree.
        pub fn contains(&self, key: &K) -> bool
        where
            K: Ord,
        {
            self.core.search(key).is_some()
        }

        /// Number of keys in the tree.
        pub fn len(&self) -> usize {
            self.core.len
        }

        /// Whether the tree holds no keys.
        pub fn is_empty(&self) -> bool {
            self.core.len == 0
        }

        /// Removes every key. Their nodes move to the freed list.
        pub fn clear(&mut self) {
            self.core.clear();
        }

        /// Drops every node on the freed list.
        pub fn clear_freed(&mut self) {
            self.core.arena.clear_freed(&mut self.core.root);
        }

        /// Makes sure at least `n` nodes wait on the freed list, so the next `n` insertions do
        /// not allocate.
        pub fn preallocate(&mut self, n: usize) {
            self.core.arena.preallocate(n);
        }

        /// Number of nodes on the freed list.
        pub fn freed_len(&self) -> usize {
            self.core.arena.freed_len()
        }

        /// Appends every key, in ascending order, to `out`.
        pub fn extract_keys_in_order(&self, out: &mut Vec<K>)
        where
            K: Clone,
        {
            self.core.extract_keys_in_order(out);
        }

        /// Every key in ascending order.
        pub fn keys(&self) -> Vec<K>
        where
            K: Clone,
        {
            let mut keys = Vec::with_capacity(self.core.len);
            self.core.extract_keys_in_order(&mut keys);
            keys
        }

        /// Number of nodes on the longest root-to-leaf path.
        pub fn height(&self) -> usize {
            self.core.height()
        }

        /// Size in bytes of one node.
        pub fn node_size(&self) -> usize {
            std::mem::size_of::<crate::rb::RbNode<K>>()
        }

        /// The rotation counters.
        pub fn rotations(&self) -> &$rotations {
            &self.rotations
        }

        /// The rotation counters, for resetting between measurements.
        pub fn rotations_mut(&mut self) -> &mut $rotations {
            &mut self.rotations
        }
    };
}

use forward_to_core;
