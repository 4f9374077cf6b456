//! Errors raised by [`OrderedTree`](crate::OrderedTree) operations.

use crate::{node_count::NodeCount, position::Position};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    displaydoc::Display,
    thiserror::Error,
)]
pub enum Error {
    /// Position {pos:?} was not issued by this tree.
    InvalidPosition { pos: Position },
    /// Position {pos:?} refers to a node that has been removed.
    StalePosition { pos: Position },
    /// Cannot add a root to a tree that already holds {size} nodes.
    TreeNotEmpty { size: NodeCount },
    /// Tree structure is corrupt: {reason}
    Corrupt { reason: String },
}

impl Error {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt { reason: reason.into() }
    }
}
