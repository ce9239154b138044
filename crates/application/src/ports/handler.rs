//! Handler port
//!
//! Defines how a case dispatches its request.

use restit_domain::{DomainError, request::RequestSpec};

use super::Response;
use crate::context::Context;

/// Errors a handler reports when it cannot produce a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The request could not be turned into a transport request.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    /// The request URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// No connection could be made.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was reached.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Configured redirect limit
        max: usize,
    },

    /// The context was cancelled or expired before dispatch.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for dispatching one request and producing one response.
///
/// Implemented by the live HTTP adapter and the in-process recorder in the
/// infrastructure layer. Any `Fn(&Context, RequestSpec) -> Result<..>`
/// closure is also a handler.
pub trait Handler: Send + Sync {
    /// Sends `request` and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained.
    fn handle(
        &self,
        ctx: &Context,
        request: RequestSpec,
    ) -> Result<Box<dyn Response>, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Context, RequestSpec) -> Result<Box<dyn Response>, HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        ctx: &Context,
        request: RequestSpec,
    ) -> Result<Box<dyn Response>, HandlerError> {
        self(ctx, request)
    }
}

/// Pins a closure to the handler signature so its argument and return
/// types are inferred.
///
/// ```
/// use restit_application::ports::{HandlerError, handler_fn};
///
/// let handler = handler_fn(|_ctx, request| {
///     Err(HandlerError::Other(format!("no route for {}", request.url)))
/// });
/// # let _ = handler;
/// ```
pub const fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Context, RequestSpec) -> Result<Box<dyn Response>, HandlerError> + Send + Sync,
{
    f
}
