//!

use crate::position::NodeIdx;

/// The upward relation of a node.
#[rustfmt::skip]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
)]
pub(crate) enum Parent {
    Root,
    Node(NodeIdx),
    /// The node was removed; its slot sits in the garbage queue.
    Defunct,
}

#[rustfmt::skip]
#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
)]
pub(crate) struct Node<E> {
    pub idx: NodeIdx,
    pub generation: u64,
    pub parent: Parent,
    pub first_child: Option<NodeIdx>,
    pub next_sibling: Option<NodeIdx>,
    pub element: Option<E>,
}

impl<E> Node<E> {
    pub fn new(idx: NodeIdx, element: E) -> Self {
        Self {
            idx,
            generation: 0,
            parent: Parent::Root,
            first_child: None,
            next_sibling: None,
            element: Some(element),
        }
    }

    #[inline]
    pub fn parent_idx(&self) -> Option<NodeIdx> {
        match self.parent {
            Parent::Node(pidx) => Some(pidx),
            Parent::Root | Parent::Defunct => None,
        }
    }

    #[inline]
    pub fn is_root_node(&self) -> bool {
        self.parent == Parent::Root
    }

    #[inline]
    pub fn is_leaf_node(&self) -> bool {
        self.first_child.is_none()
    }

    #[inline]
    pub fn is_defunct(&self) -> bool {
        self.parent == Parent::Defunct
    }

    /// Clear every link of `self`, mark it defunct and bump its
    /// generation.  Return the element it held.
    pub fn tombstone(&mut self) -> Option<E> {
        self.parent = Parent::Defunct;
        self.first_child = None;
        self.next_sibling = None;
        self.generation = self.generation.wrapping_add(1);
        self.element.take()
    }

    /// Bring a defunct node back to life as a detached node holding
    /// `element`.  The generation is left as-is, since `tombstone()`
    /// already moved it past every handle issued for the old occupant.
    pub fn revive(&mut self, element: E) {
        debug_assert!(self.is_defunct());
        self.parent = Parent::Root;
        self.element = Some(element);
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for Node<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ds = f.debug_struct("Node");
        let ds = ds.field("idx", &self.idx);
        let ds = ds.field("generation", &self.generation);
        let ds = ds.field("parent", &self.parent);
        let ds = ds.field("first_child", &self.first_child);
        let ds = ds.field("next_sibling", &self.next_sibling);
        let ds = ds.field("element", &self.element);
        ds.finish()
    }
}
