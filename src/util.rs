use std::fmt;

/// Which child slot of a node a link lives in.
///
/// Every engine writes its rebalancing cases once in terms of a `Side` and its
/// [`opposite`](Side::opposite) instead of spelling out the mirror images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The left child slot (smaller keys).
    Left,
    /// The right child slot (larger keys).
    Right,
}

impl Side {
    /// The mirror of this side.
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Node color for the red-black family. An empty link counts as `Black`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    /// A red node: its parent's black height is shared with it.
    Red,
    /// A black node: contributes one to the black height.
    Black,
}

impl Color {
    /// The complementary color.
    pub(crate) fn flipped(self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => f.write_str("red"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Upper bound on the height of an AVL tree holding `len` keys.
#[cfg(test)]
pub(crate) fn avl_height_bound(len: usize) -> usize {
    (1.4404 * ((len + 2) as f64).log2() - 0.3277).floor() as usize
}

/// Upper bound on the height of a red-black tree holding `len` keys.
#[cfg(test)]
pub(crate) fn rb_height_bound(len: usize) -> usize {
    (2.0 * ((len + 1) as f64).log2()).floor() as usize
}
