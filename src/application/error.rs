//! Application-level errors (wraps domain and storage errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::StorageError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// The wrapped domain error, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error means the closure table can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(DomainError::InconsistentState(_))
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
