//! Handles through which callers address the nodes of an
//! [`OrderedTree`](crate::OrderedTree).

use std::sync::atomic::{AtomicU64, Ordering};

/// The index of a slot in a tree's node arena.
#[rustfmt::skip]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    derive_more::From
)]
pub struct NodeIdx(pub(crate) usize);

impl std::fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "NodeIdx({})", self.0)
    }
}

impl std::fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies one tree value for the lifetime of the process.
#[rustfmt::skip]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "TreeId({})", self.0)
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// An opaque handle to a node of a specific tree.
///
/// A `Position` stays valid until the node it refers to is removed.
/// Arena slots are recycled, so the handle also records the slot
/// generation it was issued for: a handle that outlives its node never
/// resolves to whatever node occupies the slot afterwards.
#[rustfmt::skip]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct Position {
    pub(crate) tree: TreeId,
    pub(crate) idx: NodeIdx,
    pub(crate) generation: u64,
}

impl Position {
    #[inline]
    pub fn tree_id(&self) -> TreeId {
        self.tree
    }

    #[inline]
    pub fn idx(&self) -> NodeIdx {
        self.idx
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Position({}:{}@{})", self.tree, self.idx, self.generation)
    }
}
