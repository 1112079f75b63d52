use thiserror::Error;

use crate::arena::NodeId;

/// Boxed error produced by a caller-supplied item class.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("invalid level {level}: tree has {depth} levels")]
    InvalidLevel { level: isize, depth: usize },

    #[error("not enough nodes at level {level}: wanted {wanted}, found {found}")]
    InsufficientNodes {
        wanted: usize,
        found: usize,
        level: isize,
    },

    #[error("item class rejected leaf value: {0}")]
    Coercion(#[source] BoxError),

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("child index {index} out of range for {parent} with {len} children")]
    ChildIndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("no node at position {0:?}")]
    InvalidPosition(Vec<usize>),

    #[error("cannot remove the root node of a tree")]
    CannotRemoveRoot,

    #[error("input nested deeper than the maximum depth of {0}")]
    DepthLimitExceeded(usize),

    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
