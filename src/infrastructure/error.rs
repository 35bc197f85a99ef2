//! Infrastructure-level errors (storage primitives, wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::NodeId;

/// Failures of the storage primitives behind the node table and closure relation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("node {0} already stored")]
    DuplicateNode(NodeId),

    #[error("node {0} not stored")]
    MissingNode(NodeId),

    #[error("closure edge ({ancestor}, {descendant}) already stored")]
    DuplicateEdge { ancestor: NodeId, descendant: NodeId },

    #[error("closure edge ({ancestor}, {descendant}) not stored")]
    MissingEdge { ancestor: NodeId, descendant: NodeId },

    #[error("transaction already open")]
    TransactionAlreadyOpen,

    #[error("no open transaction")]
    NoTransaction,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Result type for storage primitives.
pub type StorageResult<T> = Result<T, StorageError>;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
