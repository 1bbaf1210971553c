//! Node storage shared by every engine.
//!
//! Nodes refer to each other through [`NodeId`] indices into a slot table, so parent
//! back-references are plain indices and never own anything. What a slot holds depends on the
//! [`Storage`] policy: the node itself, laid out contiguously with its neighbours, or a `Box` with
//! the node allocated on its own.
//!
//! A released slot is threaded onto the freed list through its own `next` index and keeps its
//! storage; the next insertion takes it back before anything is allocated. With the freed list
//! disabled, released slots are still reused but are not reported by [`Arena::freed_len`], and a
//! boxed node's allocation is dropped right away.

use std::mem::{self, MaybeUninit};
use std::ops::{Index, IndexMut};

use log::debug;

use crate::config::Storage;
use crate::util::Side;

/// Index of a slot in an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("node arena holds at most u32::MAX slots"))
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// An empty link or the id of the node it owns.
pub(crate) type Link = Option<NodeId>;

/// Where the memory of one attached node lives.
trait Place: Sized {
    type Node;
    /// What a freed slot keeps so the next node can move in without allocating.
    type Spare: Clone;

    fn new(node: Self::Node) -> Self;
    fn spare() -> Self::Spare;
    fn reuse(spare: Self::Spare, node: Self::Node) -> Self;
    fn detach(self) -> (Self::Node, Self::Spare);
    fn node(&self) -> &Self::Node;
    fn node_mut(&mut self) -> &mut Self::Node;
}

/// A node stored directly in its slot.
#[derive(Clone)]
struct Inline<N>(N);

impl<N> Place for Inline<N> {
    type Node = N;
    type Spare = ();

    fn new(node: N) -> Self {
        Inline(node)
    }

    fn spare() -> Self::Spare {}

    fn reuse(_spare: (), node: N) -> Self {
        Inline(node)
    }

    fn detach(self) -> (N, ()) {
        (self.0, ())
    }

    fn node(&self) -> &N {
        &self.0
    }

    fn node_mut(&mut self) -> &mut N {
        &mut self.0
    }
}

/// A node in its own heap allocation.
#[derive(Clone)]
struct Boxed<N>(Box<N>);

/// The allocation of a released [`Boxed`] node, waiting for the next one.
struct Spare<N>(Box<MaybeUninit<N>>);

impl<N> Clone for Spare<N> {
    fn clone(&self) -> Self {
        Boxed::<N>::spare()
    }
}

impl<N> Place for Boxed<N> {
    type Node = N;
    type Spare = Spare<N>;

    fn new(node: N) -> Self {
        Boxed(Box::new(node))
    }

    fn spare() -> Spare<N> {
        Spare(Box::new(MaybeUninit::uninit()))
    }

    fn reuse(spare: Spare<N>, node: N) -> Self {
        let raw = Box::into_raw(spare.0).cast::<N>();
        // SAFETY: The allocation was made for a `MaybeUninit<N>`, which has the size and alignment
        // of `N`. The write initializes it before `Box::from_raw` takes it back, so the box owns a
        // valid `N` allocated with the layout it will be freed with.
        unsafe {
            raw.write(node);
            Boxed(Box::from_raw(raw))
        }
    }

    fn detach(self) -> (N, Spare<N>) {
        let raw = Box::into_raw(self.0);
        // SAFETY: `raw` comes from a live `Box<N>`, so it is aligned and holds an initialized node.
        // After the read the memory is logically uninitialized, which is what `MaybeUninit<N>`
        // allows, and dropping that box frees the allocation without dropping the node twice.
        unsafe {
            let node = raw.read();
            (node, Spare(Box::from_raw(raw.cast::<MaybeUninit<N>>())))
        }
    }

    fn node(&self) -> &N {
        &self.0
    }

    fn node_mut(&mut self) -> &mut N {
        &mut self.0
    }
}

#[derive(Clone)]
enum Slot<P: Place> {
    /// Holds a node that is part of the tree.
    Attached(P),
    /// On the freed list; `next` is the following freed slot.
    Freed { next: Link, spare: P::Spare },
    /// Reusable but not counted as freed, because the freed list is disabled.
    Vacant { next: Link },
}

/// The slot table and free chains for one storage policy.
#[derive(Clone)]
struct Table<P: Place> {
    slots: Vec<Slot<P>>,
    freed: Link,
    freed_len: usize,
    vacant: Link,
    recycle: bool,
}

impl<P: Place> Table<P> {
    fn new(recycle: bool) -> Self {
        Self {
            slots: Vec::new(),
            freed: None,
            freed_len: 0,
            vacant: None,
            recycle,
        }
    }

    fn acquire(&mut self, node: P::Node) -> NodeId {
        if let Some(id) = self.freed {
            let Slot::Freed { next, spare } = self.take_slot(id) else {
                panic!("{:?} is on the freed list but not freed", id)
            };
            self.freed = next;
            self.freed_len -= 1;
            self.slots[id.index()] = Slot::Attached(P::reuse(spare, node));
            id
        } else if let Some(id) = self.vacant {
            let Slot::Vacant { next } = self.take_slot(id) else {
                panic!("{:?} is on the vacant list but not vacant", id)
            };
            self.vacant = next;
            self.slots[id.index()] = Slot::Attached(P::new(node));
            id
        } else {
            let id = NodeId::new(self.slots.len());
            self.slots.push(Slot::Attached(P::new(node)));
            id
        }
    }

    fn release(&mut self, id: NodeId) -> P::Node {
        let Slot::Attached(place) = self.take_slot(id) else {
            panic!("released {:?} twice", id)
        };
        let (node, spare) = place.detach();
        self.slots[id.index()] = if self.recycle {
            self.freed_len += 1;
            Slot::Freed {
                next: self.freed.replace(id),
                spare,
            }
        } else {
            Slot::Vacant {
                next: self.vacant.replace(id),
            }
        };
        node
    }

    fn release_all(&mut self) -> usize {
        let mut released = 0;
        for index in 0..self.slots.len() {
            if let Slot::Attached(_) = self.slots[index] {
                self.release(NodeId::new(index));
                released += 1;
            }
        }
        released
    }

    fn preallocate(&mut self, n: usize) -> usize {
        if !self.recycle {
            self.slots.reserve(n);
            return 0;
        }

        while self.freed_len < n {
            let Some(id) = self.vacant else { break };
            let Slot::Vacant { next } = self.take_slot(id) else {
                panic!("{:?} is on the vacant list but not vacant", id)
            };
            self.vacant = next;
            self.push_freed(id);
        }

        let missing = n.saturating_sub(self.freed_len);
        self.slots.reserve(missing);
        for _ in 0..missing {
            let id = NodeId::new(self.slots.len());
            self.slots.push(Slot::Vacant { next: None });
            self.push_freed(id);
        }
        missing
    }

    /// Drops every detached slot and moves the attached ones to the front, renumbering them.
    /// Returns the old-to-new id mapping, `None` for the dropped slots.
    fn compact(&mut self) -> Vec<Link> {
        let attached = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Attached(_)))
            .count();
        let mut kept = Vec::with_capacity(attached);
        let mut moved = Vec::with_capacity(self.slots.len());
        for slot in mem::take(&mut self.slots) {
            match slot {
                Slot::Attached(place) => {
                    moved.push(Some(NodeId::new(kept.len())));
                    kept.push(Slot::Attached(place));
                }
                Slot::Freed { .. } | Slot::Vacant { .. } => moved.push(None),
            }
        }

        self.slots = kept;
        self.freed = None;
        self.freed_len = 0;
        self.vacant = None;
        moved
    }

    fn node(&self, id: NodeId) -> &P::Node {
        match &self.slots[id.index()] {
            Slot::Attached(place) => place.node(),
            Slot::Freed { .. } | Slot::Vacant { .. } => panic!("{:?} is detached", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut P::Node {
        attached_mut(&mut self.slots[id.index()], id.index())
    }

    fn pair_mut(&mut self, a: NodeId, b: NodeId) -> (&mut P::Node, &mut P::Node) {
        assert_ne!(a, b, "pair_mut needs two distinct nodes");
        let (low, high, swapped) = if a.index() < b.index() {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (head, tail) = self.slots.split_at_mut(high);
        let first = attached_mut(&mut head[low], low);
        let second = attached_mut(&mut tail[0], high);
        if swapped {
            (second, first)
        } else {
            (first, second)
        }
    }

    fn take_slot(&mut self, id: NodeId) -> Slot<P> {
        mem::replace(&mut self.slots[id.index()], Slot::Vacant { next: None })
    }

    fn push_freed(&mut self, id: NodeId) {
        self.slots[id.index()] = Slot::Freed {
            next: self.freed.replace(id),
            spare: P::spare(),
        };
        self.freed_len += 1;
    }
}

fn attached_mut<P: Place>(slot: &mut Slot<P>, index: usize) -> &mut P::Node {
    match slot {
        Slot::Attached(place) => place.node_mut(),
        Slot::Freed { .. } | Slot::Vacant { .. } => panic!("slot {} is detached", index),
    }
}

#[derive(Clone)]
enum Tables<N> {
    Contiguous(Table<Inline<N>>),
    Boxed(Table<Boxed<N>>),
}

/// The nodes of one tree, stored under one of the [`Storage`] policies.
#[derive(Clone)]
pub(crate) struct Arena<N> {
    tables: Tables<N>,
}

/// Runs `$body` against whichever table backs `$arena`.
macro_rules! with_table {
    ($arena:expr, $table:ident => $body:expr) => {
        match $arena {
            Tables::Contiguous($table) => $body,
            Tables::Boxed($table) => $body,
        }
    };
}

impl<N> Arena<N> {
    /// An empty arena. `recycle` turns the freed list on.
    pub(crate) fn new(storage: Storage, recycle: bool) -> Self {
        let tables = match storage {
            Storage::Contiguous => Tables::Contiguous(Table::new(recycle)),
            Storage::Boxed => Tables::Boxed(Table::new(recycle)),
        };
        Self { tables }
    }

    /// Stores `node` in a freed slot if there is one, a vacant slot otherwise, and a fresh slot
    /// as a last resort.
    pub(crate) fn acquire(&mut self, node: N) -> NodeId {
        with_table!(&mut self.tables, table => table.acquire(node))
    }

    /// Detaches the node at `id`, hands it back to the caller, and puts the slot on the freed
    /// list.
    pub(crate) fn release(&mut self, id: NodeId) -> N {
        with_table!(&mut self.tables, table => table.release(id))
    }

    /// Detaches every attached node at once.
    pub(crate) fn release_all(&mut self) {
        let released = with_table!(&mut self.tables, table => table.release_all());
        debug!("detached {} nodes", released);
    }

    /// Grows the freed list until it holds at least `n` slots. Does nothing when the freed list
    /// is disabled beyond reserving room for `n` more nodes.
    pub(crate) fn preallocate(&mut self, n: usize) {
        let added = with_table!(&mut self.tables, table => table.preallocate(n));
        debug!("preallocated {} nodes, {} on the freed list", added, self.freed_len());
    }

    /// Number of slots on the freed list.
    pub(crate) fn freed_len(&self) -> usize {
        with_table!(&self.tables, table => table.freed_len)
    }

    /// Number of slots in the table, attached or not.
    fn slot_len(&self) -> usize {
        with_table!(&self.tables, table => table.slots.len())
    }

    /// Mutable access to two distinct nodes at once.
    pub(crate) fn pair_mut(&mut self, a: NodeId, b: NodeId) -> (&mut N, &mut N) {
        with_table!(&mut self.tables, table => table.pair_mut(a, b))
    }
}

/// Gives the arena enough structure to walk a tree without knowing an engine's metadata.
pub(crate) trait Branch {
    /// The link in the `side` child slot.
    fn child(&self, side: Side) -> Link;

    /// Every link the node holds: both children and the parent back-reference.
    fn links_mut(&mut self) -> [&mut Link; 3];
}

impl<N: Branch> Arena<N> {
    /// Visits every node below `root` in ascending key order.
    pub(crate) fn in_order<'a>(&'a self, root: Link, mut visit: impl FnMut(&'a N)) {
        let mut stack = Vec::new();
        let mut cursor = root;
        loop {
            while let Some(id) = cursor {
                stack.push(id);
                cursor = self[id].child(Side::Left);
            }
            let Some(id) = stack.pop() else { break };
            let node = &self[id];
            visit(node);
            cursor = node.child(Side::Right);
        }
    }

    /// Number of nodes on the longest path down from `root`.
    pub(crate) fn height(&self, root: Link) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for side in [Side::Left, Side::Right] {
                if let Some(child) = self[id].child(side) {
                    stack.push((child, depth + 1));
                }
            }
        }
        deepest
    }

    /// Gives every freed and vacant slot back to the allocator. The attached nodes are packed
    /// at the front of the table, so their ids change; every link inside the tree and `root` are
    /// rewritten to match.
    pub(crate) fn clear_freed(&mut self, root: &mut Link) {
        let before = self.slot_len();
        let moved = with_table!(&mut self.tables, table => table.compact());
        let relink = |link: &mut Link| {
            if let Some(id) = *link {
                *link = Some(moved[id.index()].expect("a link points at a detached slot"));
            }
        };

        with_table!(&mut self.tables, table => {
            for slot in &mut table.slots {
                if let Slot::Attached(place) = slot {
                    for link in place.node_mut().links_mut() {
                        relink(link);
                    }
                }
            }
        });
        relink(root);
        debug!("cleared freed list, {} slots returned", before - self.slot_len());
    }
}

impl<N> Index<NodeId> for Arena<N> {
    type Output = N;

    fn index(&self, id: NodeId) -> &N {
        with_table!(&self.tables, table => table.node(id))
    }
}

impl<N> IndexMut<NodeId> for Arena<N> {
    fn index_mut(&mut self, id: NodeId) -> &mut N {
        with_table!(&mut self.tables, table => table.node_mut(id))
    }
}
