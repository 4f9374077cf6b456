//!

use crate::arena::Arena;
use crate::node::Parent;
pub use crate::{
    error::{Error, Result},
    node_count::NodeCount,
    position::{NodeIdx, Position, TreeId},
};
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::ser::SerializeStruct;
use std::fmt;

/// An ordered general tree.
///
/// Children are kept in a singly-linked sibling chain threaded from
/// their parent's first child, in the order they were attached.  Nodes
/// live in an arena owned by the tree and are addressed through
/// [`Position`] handles.
///
/// Cloning a tree produces an independent tree with its own identity:
/// positions issued by the original are rejected by the clone.
#[derive(Debug)]
pub struct OrderedTree<E> {
    id: TreeId,
    arena: Arena<E>,
    root: Option<NodeIdx>,
}

impl<E> Default for OrderedTree<E> {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl<E: Clone> Clone for OrderedTree<E> {
    fn clone(&self) -> Self {
        Self {
            id: TreeId::fresh(),
            arena: self.arena.clone(),
            root: self.root,
        }
    }
}

impl<E> OrderedTree<E> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            id: TreeId::fresh(),
            arena: Arena::with_capacity(cap),
            root: None,
        }
    }

    #[inline]
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// The number of live nodes in `self`.
    #[inline]
    pub fn size(&self) -> NodeCount {
        self.arena.logical_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get the physical size, which is defined as the number of node
    /// slots allocated in the tree, whether they are garbage or not.
    #[inline]
    pub fn physical_size(&self) -> NodeCount {
        self.arena.physical_size()
    }

    #[inline]
    pub fn root(&self) -> Option<Position> {
        self.root.map(|idx| self.position(idx))
    }

    #[inline]
    fn position(&self, idx: NodeIdx) -> Position {
        Position {
            tree: self.id,
            idx,
            generation: self.arena[idx].generation,
        }
    }

    /// Resolve `pos` to its live node, or explain why it can't be.
    fn validate(&self, pos: Position) -> Result<NodeIdx> {
        if pos.tree != self.id {
            return Err(Error::InvalidPosition { pos });
        }
        self.arena.validate(pos)
    }

    /// Whether `pos` currently refers to a live node of `self`.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.validate(pos).is_ok()
    }

    pub fn element(&self, pos: Position) -> Result<&E> {
        let idx = self.validate(pos)?;
        self.arena[idx].element.as_ref()
            .ok_or(Error::StalePosition { pos })
    }

    pub fn element_mut(&mut self, pos: Position) -> Result<&mut E> {
        let idx = self.validate(pos)?;
        self.arena[idx].element.as_mut()
            .ok_or(Error::StalePosition { pos })
    }

    /// Store `element` at `pos`, returning the element it replaces.
    pub fn replace(&mut self, pos: Position, element: E) -> Result<E> {
        let slot = self.element_mut(pos)?;
        Ok(std::mem::replace(slot, element))
    }

    pub fn parent(&self, pos: Position) -> Result<Option<Position>> {
        let idx = self.validate(pos)?;
        Ok(self.arena[idx].parent_idx().map(|pidx| self.position(pidx)))
    }

    pub fn first_child(&self, pos: Position) -> Result<Option<Position>> {
        let idx = self.validate(pos)?;
        Ok(self.arena[idx].first_child.map(|cidx| self.position(cidx)))
    }

    pub fn next_sibling(&self, pos: Position) -> Result<Option<Position>> {
        let idx = self.validate(pos)?;
        Ok(self.arena[idx].next_sibling.map(|sidx| self.position(sidx)))
    }

    /// The children of `pos`, left to right, as of the time of the call.
    pub fn children(&self, pos: Position) -> Result<Vec<Position>> {
        let idx = self.validate(pos)?;
        Ok(self.arena.children_of(idx).map(|cidx| self.position(cidx)).collect())
    }

    pub fn num_children(&self, pos: Position) -> Result<usize> {
        let idx = self.validate(pos)?;
        Ok(self.arena.children_of(idx).count())
    }

    #[inline]
    pub fn is_root(&self, pos: Position) -> Result<bool> {
        let idx = self.validate(pos)?;
        Ok(self.arena[idx].is_root_node())
    }

    #[inline]
    pub fn is_internal(&self, pos: Position) -> Result<bool> {
        let idx = self.validate(pos)?;
        Ok(!self.arena[idx].is_leaf_node())
    }

    #[inline]
    pub fn is_external(&self, pos: Position) -> Result<bool> {
        let idx = self.validate(pos)?;
        Ok(self.arena[idx].is_leaf_node())
    }

    /// The number of edges between `pos` and the root.
    pub fn depth(&self, pos: Position) -> Result<usize> {
        let idx = self.validate(pos)?;
        Ok(self.arena.ancestors_of(idx).count())
    }

    /// The number of edges on the longest downward path from `pos` to a leaf.
    pub fn height(&self, pos: Position) -> Result<usize> {
        let idx = self.validate(pos)?;
        Ok(self.arena.dfs(idx).map(|(depth, _)| depth).max().unwrap_or(0))
    }

    /// Place `element` at the root of an empty tree.
    ///
    /// A tree holds at most one root: on a non-empty tree this fails with
    /// [`Error::TreeNotEmpty`], leaves `self` untouched and drops `element`.
    pub fn add_root(&mut self, element: E) -> Result<Position> {
        if !self.is_empty() {
            let size = self.size();
            tracing::warn!(tree = %self.id, %size, "refusing to add a second root");
            return Err(Error::TreeNotEmpty { size });
        }
        let idx = self.arena.add_node(element);
        self.root = Some(idx);
        tracing::debug!(tree = %self.id, root = %idx, "added root");
        Ok(self.position(idx))
    }

    /// Attach `element` as the last child of `parent`.
    pub fn add_child(&mut self, parent: Position, element: E) -> Result<Position> {
        let pidx = self.validate(parent)?;
        let last = self.arena.last_child(pidx);
        let cidx = self.arena.add_node(element);
        self.arena[cidx].parent = Parent::Node(pidx);
        match last {
            Some(last_idx) => self.arena[last_idx].next_sibling = Some(cidx),
            None => self.arena[pidx].first_child = Some(cidx),
        }
        tracing::debug!(tree = %self.id, parent = %pidx, child = %cidx, "added child");
        Ok(self.position(cidx))
    }

    /// Remove the node at `pos` and return its element.
    ///
    /// The children of the removed node are not removed with it: they
    /// take its place among its siblings, in their original order, and
    /// are adopted by its parent.
    ///
    /// The root is never removed this way; removing it is a no-op that
    /// returns `Ok(None)`.  Use [`Self::clear`] to empty the tree.
    pub fn remove(&mut self, pos: Position) -> Result<Option<E>> {
        let idx = self.validate(pos)?;
        let Some(parent_idx) = self.arena.splice_out(idx) else {
            tracing::debug!(tree = %self.id, node = %idx, "ignoring removal of root");
            return Ok(None);
        };
        let element = self.arena.rm_node(idx);
        tracing::debug!(tree = %self.id, node = %idx, parent = %parent_idx, "removed node");
        Ok(element)
    }

    /// Remove every node.  All positions issued so far become stale.
    pub fn clear(&mut self) {
        let size = self.size();
        self.arena.clear();
        self.root = None;
        tracing::debug!(tree = %self.id, %size, "cleared tree");
    }

    /// `(depth, element)` for every node, in pre-order.
    pub fn display_tree(&self) -> Vec<(usize, &E)> {
        let Some(root_idx) = self.root else {
            return vec![];
        };
        self.arena.dfs(root_idx)
            .filter_map(|(depth, idx)| {
                self.arena[idx].element.as_ref().map(|element| (depth, element))
            })
            .collect()
    }

    /// Every live position, in pre-order.
    pub fn positions(&self) -> Vec<Position> {
        self.root
            .map(|root_idx| {
                self.arena.dfs(root_idx).map(|(_, idx)| self.position(idx)).collect()
            })
            .unwrap_or_default()
    }

    /// Every element, in pre-order.
    pub fn elements(&self) -> impl Iterator<Item = &E> + '_ {
        self.display_tree().into_iter().map(|(_, element)| element)
    }

    /// Verify every structural invariant of `self`, returning
    /// [`Error::Corrupt`] for the first violation found.
    pub fn check_invariants(&self) -> Result<()> {
        let physical = *self.arena.physical_size();
        let node = |idx: NodeIdx| {
            self.arena.get(idx)
                .ok_or_else(|| Error::corrupt(format!("link to missing slot {idx}")))
        };
        for (pos, n) in self.arena.nodes().enumerate() {
            if n.idx != NodeIdx(pos) {
                return Err(Error::corrupt(format!("slot {pos} claims index {}", n.idx)));
            }
            if n.is_defunct() != n.element.is_none() {
                return Err(Error::corrupt(format!("slot {pos} is half tombstoned")));
            }
            if n.is_defunct() && (n.first_child.is_some() || n.next_sibling.is_some()) {
                return Err(Error::corrupt(format!("defunct slot {pos} still has links")));
            }
        }

        let mut in_garbage = vec![false; physical];
        for gidx in self.arena.garbage() {
            if !node(gidx)?.is_defunct() {
                return Err(Error::corrupt(format!("live slot {gidx} queued as garbage")));
            }
            if std::mem::replace(&mut in_garbage[gidx.0], true) {
                return Err(Error::corrupt(format!("slot {gidx} queued twice")));
            }
        }
        let defunct = self.arena.nodes().filter(|n| n.is_defunct()).count();
        if defunct != *self.arena.garbage_size() {
            return Err(Error::corrupt("defunct slot missing from garbage queue"));
        }

        let Some(root_idx) = self.root else {
            return match *self.size() {
                0 => Ok(()),
                n => Err(Error::corrupt(format!("empty tree holds {n} live nodes"))),
            };
        };
        if !node(root_idx)?.is_root_node() {
            return Err(Error::corrupt(format!("root {root_idx} has a parent")));
        }

        // Walk the links by hand: a cyclic chain would hang `Arena::dfs`.
        let mut visited = vec![false; physical];
        visited[root_idx.0] = true;
        let mut reached = 1;
        let mut stack = vec![root_idx];
        while let Some(pidx) = stack.pop() {
            let mut cursor = node(pidx)?.first_child;
            while let Some(cidx) = cursor {
                let child = node(cidx)?;
                if std::mem::replace(&mut visited[cidx.0], true) {
                    return Err(Error::corrupt(format!("slot {cidx} is linked twice")));
                }
                if child.parent != Parent::Node(pidx) {
                    return Err(Error::corrupt(format!(
                        "slot {cidx} is in the chain of {pidx} but names {:?} as parent",
                        child.parent
                    )));
                }
                reached += 1;
                stack.push(cidx);
                cursor = child.next_sibling;
            }
        }
        if reached != *self.size() {
            return Err(Error::corrupt(format!(
                "{reached} nodes reachable from the root, but {} are live",
                self.size()
            )));
        }
        Ok(())
    }
}

impl<E> PartialEq<Self> for OrderedTree<E>
where
    E: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        // NOTE: A logical comparison: slot layout, generations and
        //       garbage are ignored, only the pre-order shape counts.
        self.size() == other.size() && self.display_tree() == other.display_tree()
    }
}

#[rustfmt::skip]
impl<E> Eq for OrderedTree<E> where E: Eq {}

impl<E> fmt::Display for OrderedTree<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (depth, element) in self.display_tree() {
            writeln!(f, "{}{element}", ". ".repeat(depth))?;
        }
        Ok(())
    }
}

#[rustfmt::skip]
impl<E> Serialize for OrderedTree<E>
where
    E: Serialize,
{
    fn serialize<S: Serializer>(
        &self,
        serializer: S
    ) -> std::result::Result<S::Ok, S::Error> {
        const NUM_FIELDS: usize = 2;
        let mut state = serializer.serialize_struct("OrderedTree", NUM_FIELDS)?;
        state.serialize_field("arena", &self.arena)?;
        state.serialize_field("root", &self.root)?;
        state.end()
    }
}

// A deserialized tree gets a fresh identity, and is only accepted
// if its links hold together.
#[rustfmt::skip]
impl<'de, E> Deserialize<'de> for OrderedTree<E>
where
    E: Deserialize<'de>,
{
    fn deserialize<DE: Deserializer<'de>>(
        d: DE
    ) -> std::result::Result<Self, DE::Error> {
        #[derive(serde::Deserialize)]
        #[serde(rename = "OrderedTree")]
        struct Repr<E> {
            arena: Arena<E>,
            root: Option<NodeIdx>,
        }

        let Repr { arena, root } = Repr::deserialize(d)?;
        let tree = OrderedTree { id: TreeId::fresh(), arena, root };
        if let Err(err) = tree.check_invariants() {
            tracing::warn!(%err, "rejecting deserialized tree");
            return Err(serde::de::Error::custom(err));
        }
        Ok(tree)
    }
}

impl<E: fmt::Display> OrderedTree<E> {
    /// Render `self` on a single line, e.g. `A(B(E, F), D)`.
    pub fn to_compact_string(&self) -> String {
        enum Step {
            Enter(NodeIdx),
            Separator,
            Close,
        }

        let mut out = String::new();
        let mut stack: Vec<Step> = self.root.map(Step::Enter).into_iter().collect();
        while let Some(step) = stack.pop() {
            let idx = match step {
                Step::Enter(idx) => idx,
                Step::Separator => {
                    out.push_str(", ");
                    continue;
                }
                Step::Close => {
                    out.push(')');
                    continue;
                }
            };
            if let Some(element) = &self.arena[idx].element {
                out.push_str(&element.to_string());
            }
            let children = self.arena.children_of(idx).collect_vec();
            if children.is_empty() {
                continue;
            }
            out.push('(');
            stack.push(Step::Close);
            for (i, cidx) in children.into_iter().enumerate().rev() {
                stack.push(Step::Enter(cidx));
                if i > 0 {
                    stack.push(Step::Separator);
                }
            }
        }
        out
    }
}
