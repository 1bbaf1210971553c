use thiserror::Error;

use crate::util::{Color, Side};

/// A broken structural invariant, as reported by `validate`.
///
/// Every variant names the node where the check failed by its key, so a failing test points at
/// the subtree to look at.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantError<K> {
    /// `key` sits on the wrong side of its ancestor `ancestor`.
    #[error("key {key:?} is in the {side} subtree of {ancestor:?} but out of order with it")]
    OutOfOrder {
        /// The misplaced key.
        key: K,
        /// The ancestor it was compared against.
        ancestor: K,
        /// The subtree of `ancestor` that holds `key`.
        side: Side,
    },
    /// An AVL node whose stored balance factor disagrees with its subtree heights, or lies
    /// outside `-1..=1`.
    #[error("node {key:?} stores balance {stored} but its subtrees differ by {actual}")]
    Balance {
        /// The offending node.
        key: K,
        /// The balance factor stored in the node.
        stored: i8,
        /// `height(right) - height(left)` as measured.
        actual: isize,
    },
    /// The root of a red-black tree is red.
    #[error("root {key:?} is red")]
    RedRoot {
        /// The root's key.
        key: K,
    },
    /// A red node with a red child.
    #[error("red node {key:?} has red child {child:?}")]
    RedRed {
        /// The red parent.
        key: K,
        /// The red child.
        child: K,
    },
    /// A red right child in a left-leaning red-black tree.
    #[error("node {key:?} has red right child {child:?}")]
    RedRightChild {
        /// The parent of the red right child.
        key: K,
        /// The red right child.
        child: K,
    },
    /// The two subtrees of a node contain different numbers of black nodes on their paths.
    #[error("{color} node {key:?} has black height {left} on the left and {right} on the right")]
    BlackHeight {
        /// The node whose subtrees disagree.
        key: K,
        /// The node's own color.
        color: Color,
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// A parent back-reference that does not point at the node's actual parent.
    #[error("node {key:?} links to parent {found:?} instead of {expected:?}")]
    Parent {
        /// The child whose parent link is wrong.
        key: K,
        /// The key of the node the link should point at, `None` for the root.
        expected: Option<K>,
        /// The key of the node the link does point at, `None` for an empty link.
        found: Option<K>,
    },
    /// A cached subtree size that disagrees with the subtree.
    #[error("node {key:?} caches subtree size {stored} but holds {actual} nodes")]
    Size {
        /// The node holding the stale size.
        key: K,
        /// The cached size.
        stored: usize,
        /// `1 + size(left) + size(right)`.
        actual: usize,
    },
    /// The node count stored at the tree disagrees with the number of attached nodes.
    #[error("tree reports {stored} keys but {actual} nodes are attached")]
    Count {
        /// The count the tree reports.
        stored: usize,
        /// The number of nodes reachable from the root.
        actual: usize,
    },
}
