//! Port definitions (interfaces)
//!
//! Ports define the boundaries between case execution and the transports
//! that actually serve requests. Adapters live in the infrastructure layer.

mod handler;
mod response;

pub use handler::{Handler, HandlerError, handler_fn};
pub use response::Response;
