//! Knobs shared by every engine.

/// How a two-child node picks the node that replaces it on erase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Replacement {
    /// Always the in-order successor.
    #[default]
    Successor,
    /// The side more likely to need fewer rotations. The AVL engines take the predecessor when
    /// the node's balance is `<= 0`; the bottom-up red-black engine takes it when the left subtree
    /// is at least as large as the right one.
    Preferred,
    /// Like `Preferred`, but ties go to the successor.
    Inverted,
    /// Keep the bookkeeping `Preferred` needs, but always take the successor.
    ForcedSuccessor,
}

impl Replacement {
    /// Whether subtree sizes have to be kept up to date under this policy.
    pub(crate) fn needs_sizes(self) -> bool {
        self != Replacement::Successor
    }
}

/// How a tree allocates its nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Every node lives in one growable vector, next to its neighbours.
    #[default]
    Contiguous,
    /// Every node gets its own heap allocation. The freed list keeps those allocations for the
    /// next insertions, and `clear_freed` hands them back one by one.
    Boxed,
}

/// Per-tree configuration.
///
/// # Examples
///
/// ```
/// use balanced_bst::{AvlTree, Config, Replacement};
///
/// let config = Config::default()
///     .with_parent_links(true)
///     .with_replacement(Replacement::Preferred);
/// let mut tree = AvlTree::with_config(config);
///
/// assert!(tree.insert(1));
/// assert!(tree.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    /// Maintain parent back-references. The bottom-up and hybrid red-black trees always do, the
    /// left-leaning one never does.
    pub parent_links: bool,
    /// Replacement policy for erasing a node with two children.
    pub replacement: Replacement,
    /// Keep erased nodes on a freed list for reuse and report it through `freed_len`.
    pub freed_list: bool,
    /// Where nodes are allocated.
    pub storage: Storage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parent_links: false,
            replacement: Replacement::Successor,
            freed_list: true,
            storage: Storage::Contiguous,
        }
    }
}

impl Config {
    /// Sets [`Config::parent_links`].
    pub fn with_parent_links(mut self, parent_links: bool) -> Self {
        self.parent_links = parent_links;
        self
    }

    /// Sets [`Config::replacement`].
    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacement = replacement;
        self
    }

    /// Sets [`Config::freed_list`].
    pub fn with_freed_list(mut self, freed_list: bool) -> Self {
        self.freed_list = freed_list;
        self
    }

    /// Sets [`Config::storage`].
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }
}
