//! An ordered general tree, allocated in an arena and linked through
//! first-child/next-sibling relations rather than per-node child lists.
//!
//! Removing an inner node does not remove its subtree: its children are
//! spliced into the sibling chain in the slot the removed node held.
#![forbid(unsafe_code)]

mod arena;
pub mod error;
mod node;
pub mod node_count;
pub mod position;
pub mod tree;

#[rustfmt::skip]
pub use crate::{
    error::{Error, Result},
    node_count::NodeCount,
    position::{NodeIdx, Position, TreeId},
    tree::OrderedTree,
};

#[cfg(test)]
mod proptests;
