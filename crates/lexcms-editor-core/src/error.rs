//! Error types for the editor engine.

use thiserror::Error;

use crate::types::SurfaceId;

/// Failure of a document tree operation.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
    /// The insertion would make a node a descendant of itself.
    #[error("hierarchy request: node cannot be inserted into its own subtree")]
    HierarchyRequest,

    /// The node has no parent where one is required.
    #[error("node is detached from the document")]
    Detached,

    /// The node is not an element (or the document root) where a container is required.
    #[error("node is not a container")]
    NotAContainer,

    /// The node is not a text node.
    #[error("node is not a text node")]
    NotText,

    /// The reference node is not a child of the given parent.
    #[error("reference node is not a child of the parent")]
    NotAChild,

    /// The node has the wrong element type for the operation.
    #[error("expected a <{expected}> element")]
    WrongElement { expected: &'static str },

    /// A boundary point lies outside the scope it is being resolved against.
    #[error("boundary point lies outside its scope")]
    OutsideScope,

    /// Arena-level failure.
    #[error("tree error: {0}")]
    Tree(String),
}

impl From<indextree::NodeError> for DomError {
    fn from(e: indextree::NodeError) -> Self {
        DomError::Tree(e.to_string())
    }
}

/// Errors surfaced by the editor session.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    #[error("no editor surface is bound with id {0}")]
    UnknownSurface(SurfaceId),

    #[error("no toolbar is bound with id {0}")]
    UnknownToolbar(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}
