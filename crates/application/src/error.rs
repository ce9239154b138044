//! Application error types

use restit_domain::DomainError;
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The execution context was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The execution context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
