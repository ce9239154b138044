//! Errors raised while assembling a service.

use restit_application::{ApplicationError, HandlerError};
use thiserror::Error;

use crate::config::ConfigError;

/// Failure to build a ready-to-use service.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// The live handler could not be created.
    #[error("handler setup failed: {0}")]
    Handler(#[from] HandlerError),

    /// The base URL or noun was rejected.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for infrastructure setup.
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
