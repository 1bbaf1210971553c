//! A red-black tree repaired from the bottom up: insert and erase work like in a plain BST and
//! then walk back toward the root through parent links, recoloring and rotating until the
//! invariants hold again.
//!
//! # Examples
//!
//! ```
//! use balanced_bst::{BuRbTree, Config, Replacement};
//!
//! let mut tree = BuRbTree::with_config(Config::default().with_replacement(Replacement::Preferred));
//! for key in 0..100 {
//!     tree.insert(key);
//! }
//! for key in (0..100).step_by(2) {
//!     assert!(tree.erase(&key));
//! }
//!
//! assert_eq!(tree.len(), 50);
//! assert!(tree.validate().is_ok());
//! ```

use std::cmp::Ordering;
use std::fmt;

use log::trace;

use super::{forward_to_core, RbCore, RotationLog, Rotations};
use crate::arena::NodeId;
use crate::config::{Config, Replacement};
use crate::error::InvariantError;
use crate::util::{Color, Side};

/// Inserts `key` as a red leaf and restores the invariants on the way back up. Returns `false`
/// if the key was already present.
pub(crate) fn insert<K: Ord>(core: &mut RbCore<K>, key: K, log: &mut impl RotationLog) -> bool {
    let mut parent = None;
    let mut side = Side::Left;
    let mut cursor = core.root;
    while let Some(id) = cursor {
        side = match key.cmp(&core.arena[id].key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return false,
        };
        parent = Some(id);
        cursor = core.child(id, side);
    }

    let node = core.acquire(key);
    core.len += 1;
    let Some(parent) = parent else {
        core.root = Some(node);
        core.set_color(node, Color::Black);
        return true;
    };
    core.set_child(parent, side, Some(node));

    if core.sizes {
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            core.arena[id].size += 1;
            ancestor = core.parent(id);
        }
    }

    fix_insertion(core, node, log);
    true
}

fn fix_insertion<K>(core: &mut RbCore<K>, mut node: NodeId, log: &mut impl RotationLog) {
    while core.is_red(Some(node)) {
        let Some(parent) = core.parent(node) else { break };
        if !core.is_red(Some(parent)) {
            break;
        }
        let grandparent = core
            .parent(parent)
            .expect("a red parent is never the root");
        let side = core.side_of(grandparent, parent);
        let uncle = core.child(grandparent, side.opposite());

        if let (true, Some(uncle)) = (core.is_red(uncle), uncle) {
            core.set_color(parent, Color::Black);
            core.set_color(uncle, Color::Black);
            core.set_color(grandparent, Color::Red);
            node = grandparent;
            continue;
        }

        // Bring the new node to the outside, then lift it over the grandparent.
        let mut parent = parent;
        if core.child(parent, side.opposite()) == Some(node) {
            core.rotate_in_place(parent, side);
            log.single(side);
            parent = node;
        }
        core.rotate_in_place(grandparent, side.opposite());
        log.single(side.opposite());
        core.set_color(parent, Color::Black);
        core.set_color(grandparent, Color::Red);
        break;
    }
    core.blacken_root();
}

/// Erases `key`, replacing a node with two children by its successor or predecessor as
/// `replacement` dictates, and repairs the tree on the way back up. Returns `false` if the key
/// was not present.
pub(crate) fn erase<K: Ord>(
    core: &mut RbCore<K>,
    key: &K,
    replacement: Replacement,
    log: &mut impl RotationLog,
) -> bool {
    let Some(target) = core.search(key) else {
        return false;
    };

    let doomed = match (core.child(target, Side::Left), core.child(target, Side::Right)) {
        (Some(left), Some(right)) => {
            let (left_size, right_size) = (core.size(Some(left)), core.size(Some(right)));
            let predecessor = match replacement {
                Replacement::Preferred => left_size >= right_size,
                Replacement::Inverted => left_size > right_size,
                Replacement::Successor | Replacement::ForcedSuccessor => false,
            };
            let replacement = if predecessor {
                core.extreme(left, Side::Right)
            } else {
                core.extreme(right, Side::Left)
            };
            core.swap_keys(target, replacement);
            replacement
        }
        _ => target,
    };

    if core.sizes {
        let mut ancestor = Some(doomed);
        while let Some(id) = ancestor {
            core.arena[id].size -= 1;
            ancestor = core.parent(id);
        }
    }
    core.len -= 1;
    fix_erasure(core, doomed, log);
    true
}

/// Removes `node`, which has at most one child, and restores the black height it carried.
fn fix_erasure<K>(core: &mut RbCore<K>, node: NodeId, log: &mut impl RotationLog) {
    let child = core
        .child(node, Side::Left)
        .or_else(|| core.child(node, Side::Right));
    let parent = core.parent(node);

    if parent.is_none() || core.is_red(Some(node)) || core.is_red(child) {
        core.replace_child(parent, node, child);
        if let Some(child) = child {
            core.set_color(child, Color::Black);
        }
        core.arena.release(node);
        core.blacken_root();
        return;
    }

    // A black leaf: its path comes up one black node short. The deficit sits on `short` and
    // moves up until a red node absorbs it or a rotation makes up for it.
    let mut short = node;
    while let Some(parent) = core.parent(short) {
        let side = core.side_of(parent, short);
        let far = side.opposite();
        let mut sibling = core
            .child(parent, far)
            .expect("a node short of black height has a sibling");

        if core.is_red(Some(sibling)) {
            trace!("red sibling: rotating it over the parent");
            core.set_color(sibling, Color::Black);
            core.set_color(parent, Color::Red);
            core.rotate_in_place(parent, side);
            log.single(side);
            continue;
        }

        if !core.is_red(core.child(sibling, Side::Left))
            && !core.is_red(core.child(sibling, Side::Right))
        {
            core.set_color(sibling, Color::Red);
            if core.is_red(Some(parent)) {
                core.set_color(parent, Color::Black);
                break;
            }
            short = parent;
            continue;
        }

        if !core.is_red(core.child(sibling, far)) {
            let near = core
                .child(sibling, side)
                .expect("with a black far nephew the near nephew is red");
            core.set_color(near, Color::Black);
            core.set_color(sibling, Color::Red);
            sibling = core.rotate_in_place(sibling, far);
            log.single(far);
        }

        let far_nephew = core
            .child(sibling, far)
            .expect("the far nephew is red at this point");
        core.set_color(sibling, core.color(Some(parent)));
        core.set_color(parent, Color::Black);
        core.set_color(far_nephew, Color::Black);
        core.rotate_in_place(parent, side);
        log.single(side);
        break;
    }

    let parent = core
        .parent(node)
        .expect("a black leaf that is not the root has a parent");
    let side = core.side_of(parent, node);
    core.set_child(parent, side, None);
    core.arena.release(node);
    core.blacken_root();
}

/// A red-black tree with parent links, repaired bottom-up.
#[derive(Clone)]
pub struct BuRbTree<K> {
    core: RbCore<K>,
    replacement: Replacement,
    rotations: Rotations,
}

impl<K> Default for BuRbTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for BuRbTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_keys(f)
    }
}

impl<K> BuRbTree<K> {
    /// Creates an empty tree with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty tree. Parent links are always kept; `replacement` and `freed_list` are
    /// honored.
    pub fn with_config(config: Config) -> Self {
        Self {
            core: RbCore::new(&config, true, config.replacement.needs_sizes()),
            replacement: config.replacement,
            rotations: Rotations::default(),
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
        erase(&mut self.core, key, self.replacement, &mut self.rotations)
    }

    /// Checks key order, the red-black rules, the parent links, the cached subtree sizes when
    /// kept, and the key count.
    pub fn validate(&self) -> Result<(), InvariantError<K>>
    where
        K: Ord + Clone,
    {
        self.core.validate(false)
    }

    forward_to_core!(Rotations);
}

delegate_balanced_tree!(BuRbTree);
