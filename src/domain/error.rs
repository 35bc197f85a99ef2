//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of the tree and closure-table rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown parent node: {0}")]
    UnknownParent(NodeId),

    #[error("node not found: {0}")]
    NotFound(NodeId),

    #[error("cycle detected: cannot move {node} below its own descendant {new_parent}")]
    CycleDetected { node: NodeId, new_parent: NodeId },

    /// Closure table no longer matches the parent pointers. Fatal, never repaired.
    #[error("inconsistent closure state: {0}")]
    InconsistentState(String),

    #[error("invalid tree shape: {0}")]
    InvalidShape(String),

    #[error("deletion time already recorded for this aggregate")]
    DeletionAlreadyRecorded,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
