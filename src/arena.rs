//! This module deals with arena allocation.

use crate::{
    error::{Error, Result},
    node::{Node, Parent},
    node_count::NodeCount,
    position::{NodeIdx, Position},
};
use itertools::Itertools;
use std::collections::VecDeque;

#[derive(Clone, Debug, Hash, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub(crate) struct Arena<E> {
    nodes: Vec<Node<E>>,
    garbage: VecDeque<NodeIdx>,
}

impl<E> Default for Arena<E> {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl<E> Arena<E> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(cap),
            garbage: VecDeque::with_capacity(cap),
        }
    }

    /// Get the logical size, which is defined as `physical size - garbage size`
    /// i.e. the number of allocated, non-garbage nodes in `self`.
    #[inline]
    pub fn logical_size(&self) -> NodeCount {
        self.physical_size() - self.garbage_size()
    }

    /// Get the physical size, which is defined as the number of nodes
    /// allocated in the arena, whether they are garbage or not.
    #[inline]
    pub fn physical_size(&self) -> NodeCount {
        NodeCount::from(self.nodes.len())
    }

    /// Get the garbage size i.e. the number of garbage nodes in `self`.
    #[inline]
    pub fn garbage_size(&self) -> NodeCount {
        NodeCount::from(self.garbage.len())
    }

    #[inline]
    pub fn get(&self, idx: NodeIdx) -> Option<&Node<E>> {
        self.nodes.get(idx.0)
    }

    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = &Node<E>> {
        self.nodes.iter()
    }

    #[inline]
    pub fn garbage(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.garbage.iter().copied()
    }

    /// If there is a garbage node in `self`, recycle it.
    /// Otherwise, allocate a new one.
    /// In either case the node is detached and holds `element`.
    pub fn add_node(&mut self, element: E) -> NodeIdx {
        if let Some(node_idx) = self.garbage.pop_front() {
            self[node_idx].revive(element);
            node_idx
        } else {
            let node_idx = NodeIdx(self.nodes.len());
            self.nodes.push(Node::new(node_idx, element));
            node_idx
        }
    }

    /// Tombstone `self[node_idx]` and queue its slot for recycling.
    /// The caller is responsible for unlinking it from the tree first.
    pub fn rm_node(&mut self, node_idx: NodeIdx) -> Option<E> {
        let element = self[node_idx].tombstone();
        self.garbage.push_back(node_idx);
        element
    }

    /// Tombstone every live node.
    pub fn clear(&mut self) {
        let live: Vec<NodeIdx> = self.nodes.iter()
            .filter(|node| !node.is_defunct())
            .map(|node| node.idx)
            .collect();
        for idx in live {
            self.rm_node(idx);
        }
    }

    /// Resolve `pos` to the slot it names, provided that slot still holds
    /// the node `pos` was issued for.  Tree identity is checked by the caller.
    pub fn validate(&self, pos: Position) -> Result<NodeIdx> {
        let Some(node) = self.get(pos.idx) else {
            return Err(Error::InvalidPosition { pos });
        };
        if node.is_defunct() || node.generation != pos.generation {
            return Err(Error::StalePosition { pos });
        }
        Ok(pos.idx)
    }

    /// Walk the sibling chain of the children of `self[node_idx]`.
    pub fn children_of(
        &self,
        node_idx: NodeIdx,
    ) -> impl Iterator<Item = NodeIdx> + '_ {
        std::iter::successors(
            self[node_idx].first_child,
            move |&cidx| self[cidx].next_sibling,
        )
    }

    /// `O(k)` in the number of children of `self[node_idx]`.
    #[inline]
    pub fn last_child(&self, node_idx: NodeIdx) -> Option<NodeIdx> {
        self.children_of(node_idx).last()
    }

    /// Find the sibling immediately preceding `self[node_idx]` in the
    /// chain of `self[parent_idx]`, or `None` if it is the first child.
    pub fn prev_sibling(
        &self,
        parent_idx: NodeIdx,
        node_idx: NodeIdx,
    ) -> Option<NodeIdx> {
        self.children_of(parent_idx)
            .find(|&cidx| self[cidx].next_sibling == Some(node_idx))
    }

    pub fn ancestors_of(
        &self,
        node_idx: NodeIdx,
    ) -> impl Iterator<Item = NodeIdx> + '_ {
        std::iter::successors(
            self[node_idx].parent_idx(),
            move |&pidx| self[pidx].parent_idx(),
        )
    }

    /// Pre-order traversal of the subtree rooted in `self[start_idx]`,
    /// yielding `(depth, idx)` with depth measured from `start_idx`.
    pub fn dfs(
        &self,
        start_idx: NodeIdx,
    ) -> impl DoubleEndedIterator<Item = (usize, NodeIdx)> {
        let mut output = vec![];
        let mut stack = vec![(0, start_idx)];
        while let Some((depth, node_idx)) = stack.pop() {
            output.push((depth, node_idx));
            let children = self.children_of(node_idx).collect_vec();
            stack.extend(children.into_iter().rev().map(|cidx| (depth + 1, cidx)));
        }
        output.into_iter()
    }

    /// Detach `self[node_idx]` from its parent's sibling chain, putting
    /// its children in its place.  Return the former parent.
    ///
    /// `self[node_idx]` must be live and not the root.
    pub fn splice_out(&mut self, node_idx: NodeIdx) -> Option<NodeIdx> {
        let parent_idx = self[node_idx].parent_idx()?;
        let anchor = self.prev_sibling(parent_idx, node_idx);
        let next = self[node_idx].next_sibling;
        let children = self.children_of(node_idx).collect_vec();
        for &cidx in &children {
            self[cidx].parent = Parent::Node(parent_idx);
        }
        if let Some(&last_idx) = children.last() {
            self[last_idx].next_sibling = next;
        }
        let replacement = children.first().copied().or(next);
        match anchor {
            Some(prev_idx) => self[prev_idx].next_sibling = replacement,
            None => self[parent_idx].first_child = replacement,
        }
        tracing::trace!(
            node = %node_idx,
            parent = %parent_idx,
            anchor = ?anchor,
            reattached = children.len(),
            "spliced node out of sibling chain"
        );
        self[node_idx].first_child = None;
        self[node_idx].next_sibling = None;
        Some(parent_idx)
    }
}

impl<E> std::ops::Index<NodeIdx> for Arena<E> {
    type Output = Node<E>;

    fn index(&self, idx: NodeIdx) -> &Self::Output {
        &self.nodes[idx.0]
    }
}

impl<E> std::ops::IndexMut<NodeIdx> for Arena<E> {
    fn index_mut(&mut self, idx: NodeIdx) -> &mut Self::Output {
        &mut self.nodes[idx.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::TreeId;

    fn link(arena: &mut Arena<&'static str>, pidx: NodeIdx, cidx: NodeIdx) {
        arena[cidx].parent = Parent::Node(pidx);
        match arena.last_child(pidx) {
            Some(last) => arena[last].next_sibling = Some(cidx),
            None => arena[pidx].first_child = Some(cidx),
        }
    }

    #[test]
    fn garbage_is_recycled_in_fifo_order() {
        let mut arena = Arena::default();
        let a = arena.add_node("a");
        let b = arena.add_node("b");
        let c = arena.add_node("c");
        assert_eq!(arena.rm_node(c), Some("c"));
        assert_eq!(arena.rm_node(a), Some("a"));
        assert_eq!(arena.logical_size(), 1);
        assert_eq!(arena.garbage_size(), 2);

        assert_eq!(arena.add_node("d"), c);
        assert_eq!(arena.add_node("e"), a);
        assert_eq!(arena.add_node("f"), NodeIdx(3));
        assert_eq!(arena[b].element, Some("b"));
        assert_eq!(arena[c].generation, 1);
        assert_eq!(arena.physical_size(), 4);
        assert_eq!(arena.garbage_size(), 0);
    }

    #[test]
    fn validate_checks_slot_and_generation() {
        let tree = TreeId::fresh();
        let mut arena = Arena::default();
        let a = arena.add_node("a");
        let pos = Position { tree, idx: a, generation: 0 };
        assert_eq!(arena.validate(pos), Ok(a));

        let out_of_range = Position { tree, idx: NodeIdx(9), generation: 0 };
        assert_eq!(
            arena.validate(out_of_range),
            Err(Error::InvalidPosition { pos: out_of_range })
        );

        arena.rm_node(a);
        assert_eq!(arena.validate(pos), Err(Error::StalePosition { pos }));
        arena.add_node("b");
        assert_eq!(arena.validate(pos), Err(Error::StalePosition { pos }));
    }

    #[test]
    fn splice_out_middle_child() {
        let mut arena = Arena::default();
        let root = arena.add_node("root");
        let a = arena.add_node("a");
        let b = arena.add_node("b");
        let c = arena.add_node("c");
        let b0 = arena.add_node("b0");
        let b1 = arena.add_node("b1");
        link(&mut arena, root, a);
        link(&mut arena, root, b);
        link(&mut arena, root, c);
        link(&mut arena, b, b0);
        link(&mut arena, b, b1);

        assert_eq!(arena.splice_out(b), Some(root));
        let children = arena.children_of(root).collect_vec();
        assert_eq!(children, [a, b0, b1, c]);
        assert_eq!(arena[b0].parent, Parent::Node(root));
        assert_eq!(arena[b1].parent, Parent::Node(root));
        assert!(arena[b].is_leaf_node());
        assert_eq!(arena[b].next_sibling, None);
    }

    #[test]
    fn splice_out_root_is_refused() {
        let mut arena = Arena::default();
        let root = arena.add_node("root");
        let a = arena.add_node("a");
        link(&mut arena, root, a);
        assert_eq!(arena.splice_out(root), None);
        assert_eq!(arena.children_of(root).collect_vec(), [a]);
    }

    #[test]
    fn dfs_reports_depths() {
        let mut arena = Arena::default();
        let root = arena.add_node("root");
        let a = arena.add_node("a");
        let a0 = arena.add_node("a0");
        let b = arena.add_node("b");
        link(&mut arena, root, a);
        link(&mut arena, a, a0);
        link(&mut arena, root, b);
        let order = arena.dfs(root).collect_vec();
        assert_eq!(order, [(0, root), (1, a), (2, a0), (1, b)]);
        assert_eq!(arena.ancestors_of(a0).collect_vec(), [a, root]);
    }
}
