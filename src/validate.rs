//! Structural checks behind every engine's `validate`.
//!
//! Each check walks the whole tree once and reports the first broken invariant it meets, naming
//! the node by its key.

use crate::arena::{Arena, Branch, Link};
use crate::avl::AvlNode;
use crate::error::InvariantError;
use crate::rb::{RbCore, RbNode};
use crate::util::{Color, Side};

/// The open interval a key must fall into, given by the nearest ancestors it went right and
/// left of.
#[derive(Clone, Copy)]
struct Bounds<'a, K> {
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

impl<'a, K: Ord + Clone> Bounds<'a, K> {
    fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    fn check(&self, key: &K) -> Result<(), InvariantError<K>> {
        if let Some(lower) = self.lower.filter(|lower| key <= *lower) {
            return Err(InvariantError::OutOfOrder {
                key: key.clone(),
                ancestor: lower.clone(),
                side: Side::Right,
            });
        }
        if let Some(upper) = self.upper.filter(|upper| key >= *upper) {
            return Err(InvariantError::OutOfOrder {
                key: key.clone(),
                ancestor: upper.clone(),
                side: Side::Left,
            });
        }
        Ok(())
    }

    /// The bounds of the `side` subtree of `key`.
    fn below(&self, key: &'a K, side: Side) -> Self {
        match side {
            Side::Left => Self {
                upper: Some(key),
                ..*self
            },
            Side::Right => Self {
                lower: Some(key),
                ..*self
            },
        }
    }
}

fn check_count<K>(stored: usize, actual: usize) -> Result<(), InvariantError<K>> {
    if stored == actual {
        Ok(())
    } else {
        Err(InvariantError::Count { stored, actual })
    }
}

/// Checks an AVL tree: key order, stored balance factors against measured heights, parent
/// links when `parent_links` is set, and the key count.
pub(crate) fn avl<K: Ord + Clone, V>(
    arena: &Arena<AvlNode<K, V>>,
    root: Link,
    len: usize,
    parent_links: bool,
) -> Result<(), InvariantError<K>> {
    let mut walk = AvlWalk {
        arena,
        parent_links,
        count: 0,
    };
    walk.visit(root, None, Bounds::unbounded())?;
    check_count(len, walk.count)
}

struct AvlWalk<'a, K, V> {
    arena: &'a Arena<AvlNode<K, V>>,
    parent_links: bool,
    count: usize,
}

impl<'a, K: Ord + Clone, V> AvlWalk<'a, K, V> {
    fn key(&self, link: Link) -> Option<K> {
        link.map(|id| self.arena[id].key.clone())
    }

    /// Returns the height of the subtree at `link`.
    fn visit(
        &mut self,
        link: Link,
        parent: Link,
        bounds: Bounds<'a, K>,
    ) -> Result<isize, InvariantError<K>> {
        let Some(id) = link else {
            return Ok(0);
        };
        let arena = self.arena;
        let node = &arena[id];
        if self.parent_links && node.parent != parent {
            return Err(InvariantError::Parent {
                key: node.key.clone(),
                expected: self.key(parent),
                found: self.key(node.parent),
            });
        }
        bounds.check(&node.key)?;
        self.count += 1;

        let left = self.visit(node.left, Some(id), bounds.below(&node.key, Side::Left))?;
        let right = self.visit(node.right, Some(id), bounds.below(&node.key, Side::Right))?;
        let actual = right - left;
        if actual != isize::from(node.bal) || !(-1..=1).contains(&actual) {
            return Err(InvariantError::Balance {
                key: node.key.clone(),
                stored: node.bal,
                actual,
            });
        }
        Ok(1 + left.max(right))
    }
}

/// Checks a red-black tree: key order, a black root, no red node with a red child, equal black
/// heights, no red right child when `left_leaning` is set, and the parent links, subtree sizes
/// and key count as far as the engine keeps them.
pub(crate) fn red_black<K: Ord + Clone>(
    core: &RbCore<K>,
    left_leaning: bool,
) -> Result<(), InvariantError<K>> {
    if let Some(root) = core.root.filter(|&root| core.is_red(Some(root))) {
        return Err(InvariantError::RedRoot {
            key: core.arena[root].key.clone(),
        });
    }
    let walk = RbWalk { core, left_leaning };
    let (_, count) = walk.visit(core.root, None, Bounds::unbounded())?;
    check_count(core.len, count)
}

struct RbWalk<'a, K> {
    core: &'a RbCore<K>,
    left_leaning: bool,
}

impl<'a, K: Ord + Clone> RbWalk<'a, K> {
    fn key(&self, link: Link) -> Option<K> {
        link.map(|id| self.core.arena[id].key.clone())
    }

    fn red_child(&self, node: &RbNode<K>, side: Side) -> Option<K> {
        let child = node.child(side);
        if self.core.is_red(child) {
            self.key(child)
        } else {
            None
        }
    }

    /// Returns the black height and the node count of the subtree at `link`.
    fn visit(
        &self,
        link: Link,
        parent: Link,
        bounds: Bounds<'a, K>,
    ) -> Result<(usize, usize), InvariantError<K>> {
        let Some(id) = link else {
            return Ok((0, 0));
        };
        let core = self.core;
        let node = &core.arena[id];
        if core.parents && node.parent != parent {
            return Err(InvariantError::Parent {
                key: node.key.clone(),
                expected: self.key(parent),
                found: self.key(node.parent),
            });
        }
        bounds.check(&node.key)?;
        self.check_colors(node)?;

        let (left_black, left_count) =
            self.visit(node.left, Some(id), bounds.below(&node.key, Side::Left))?;
        let (right_black, right_count) =
            self.visit(node.right, Some(id), bounds.below(&node.key, Side::Right))?;
        if left_black != right_black {
            return Err(InvariantError::BlackHeight {
                key: node.key.clone(),
                color: node.color,
                left: left_black,
                right: right_black,
            });
        }
        let count = 1 + left_count + right_count;
        if core.sizes && node.size != count {
            return Err(InvariantError::Size {
                key: node.key.clone(),
                stored: node.size,
                actual: count,
            });
        }
        let black = usize::from(node.color == Color::Black);
        Ok((left_black + black, count))
    }

    fn check_colors(&self, node: &RbNode<K>) -> Result<(), InvariantError<K>> {
        if self.left_leaning {
            if let Some(child) = self.red_child(node, Side::Right) {
                return Err(InvariantError::RedRightChild {
                    key: node.key.clone(),
                    child,
                });
            }
        }
        if node.color == Color::Red {
            for side in [Side::Left, Side::Right] {
                if let Some(child) = self.red_child(node, side) {
                    return Err(InvariantError::RedRed {
                        key: node.key.clone(),
                        child,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeId;
    use crate::config::{Config, Storage};

    fn avl_node(key: u32, bal: i8) -> AvlNode<u32, ()> {
        AvlNode {
            key,
            value: (),
            bal,
            left: None,
            right: None,
            parent: None,
        }
    }

    /// 2 over 1 and 3, the way an AVL tree stores it without parent links.
    fn avl_triangle() -> (Arena<AvlNode<u32, ()>>, NodeId) {
        let mut arena = Arena::new(Storage::Contiguous, true);
        let one = arena.acquire(avl_node(1, 0));
        let three = arena.acquire(avl_node(3, 0));
        let mut root = avl_node(2, 0);
        root.left = Some(one);
        root.right = Some(three);
        let root = arena.acquire(root);
        (arena, root)
    }

    fn rb_node(core: &mut RbCore<u32>, key: u32, color: Color) -> NodeId {
        let id = core.acquire(key);
        core.set_color(id, color);
        id
    }

    /// 2 over 1 and 3, all black, with a red 4 right of 3.
    fn rb_tree(parents: bool, sizes: bool) -> RbCore<u32> {
        let config = Config::default().with_storage(Storage::Boxed);
        let mut core = RbCore::new(&config, parents, sizes);
        let one = rb_node(&mut core, 1, Color::Black);
        let two = rb_node(&mut core, 2, Color::Black);
        let three = rb_node(&mut core, 3, Color::Black);
        let four = rb_node(&mut core, 4, Color::Red);
        core.set_child(three, Side::Right, Some(four));
        core.set_child(two, Side::Left, Some(one));
        core.set_child(two, Side::Right, Some(three));
        core.update_size(three);
        core.update_size(two);
        core.root = Some(two);
        core.len = 4;
        core
    }

    #[test]
    fn valid_trees_pass() {
        let (arena, root) = avl_triangle();
        avl(&arena, Some(root), 3, false).unwrap();
        red_black(&rb_tree(true, true), false).unwrap();
    }

    #[test]
    fn bounds_name_the_violated_ancestor() {
        let five = 5;
        let bounds = Bounds::unbounded().below(&five, Side::Left);
        assert!(bounds.check(&4).is_ok());
        assert_eq!(
            bounds.check(&7),
            Err(InvariantError::OutOfOrder {
                key: 7,
                ancestor: 5,
                side: Side::Left
            })
        );

        let bounds = Bounds::unbounded().below(&five, Side::Right);
        assert_eq!(
            bounds.check(&5),
            Err(InvariantError::OutOfOrder {
                key: 5,
                ancestor: 5,
                side: Side::Right
            })
        );
    }

    #[test]
    fn grandchild_out_of_order() {
        let mut core = rb_tree(false, false);
        let four = core.search(&4).unwrap();
        core.arena[four].key = 0;
        assert_eq!(
            red_black(&core, false),
            Err(InvariantError::OutOfOrder {
                key: 0,
                ancestor: 3,
                side: Side::Right
            })
        );
    }

    #[test]
    fn avl_balance_out_of_range() {
        let mut arena = Arena::new(Storage::Contiguous, true);
        let three = arena.acquire(avl_node(3, 0));
        let mut two = avl_node(2, 1);
        two.right = Some(three);
        let two = arena.acquire(two);
        let mut one = avl_node(1, 2);
        one.right = Some(two);
        let one = arena.acquire(one);
        assert_eq!(
            avl(&arena, Some(one), 3, false),
            Err(InvariantError::Balance {
                key: 1,
                stored: 2,
                actual: 2
            })
        );
    }

    #[test]
    fn missing_avl_parent_link() {
        let (arena, root) = avl_triangle();
        assert_eq!(
            avl(&arena, Some(root), 3, true),
            Err(InvariantError::Parent {
                key: 1,
                expected: Some(2),
                found: None
            })
        );
    }

    #[test]
    fn red_root() {
        let mut core = rb_tree(false, false);
        let root = core.root.unwrap();
        core.set_color(root, Color::Red);
        assert_eq!(red_black(&core, false), Err(InvariantError::RedRoot { key: 2 }));
    }

    #[test]
    fn red_red() {
        let mut core = rb_tree(false, false);
        let three = core.search(&3).unwrap();
        core.set_color(three, Color::Red);
        assert_eq!(
            red_black(&core, false),
            Err(InvariantError::RedRed { key: 3, child: 4 })
        );
    }

    #[test]
    fn unequal_black_heights() {
        let mut core = rb_tree(false, false);
        let four = core.search(&4).unwrap();
        core.set_color(four, Color::Black);
        assert_eq!(
            red_black(&core, false),
            Err(InvariantError::BlackHeight {
                key: 3,
                color: Color::Black,
                left: 0,
                right: 1
            })
        );
    }

    #[test]
    fn red_right_child_only_matters_when_left_leaning() {
        let core = rb_tree(false, false);
        assert!(red_black(&core, false).is_ok());
        assert_eq!(
            red_black(&core, true),
            Err(InvariantError::RedRightChild { key: 3, child: 4 })
        );
    }

    #[test]
    fn stale_size() {
        let mut core = rb_tree(false, true);
        let root = core.root.unwrap();
        core.arena[root].size = 3;
        assert_eq!(
            red_black(&core, false),
            Err(InvariantError::Size {
                key: 2,
                stored: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn miscounted_tree() {
        let mut core = rb_tree(false, false);
        core.len = 5;
        assert_eq!(
            red_black(&core, false),
            Err(InvariantError::Count {
                stored: 5,
                actual: 4
            })
        );
        let (arena, root) = avl_triangle();
        assert_eq!(
            avl(&arena, Some(root), 2, false),
            Err(InvariantError::Count {
                stored: 2,
                actual: 3
            })
        );
    }
}
