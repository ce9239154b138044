//! RESTit Application - Case execution and expectations
//!
//! This crate defines the application layer with:
//! - Port traits for handlers and responses
//! - The execution context, the cached response decorator and the
//!   expectation engine
//! - The case executor and the service builder on top of it

pub mod case;
pub mod context;
pub mod error;
pub mod expectation;
pub mod ports;
pub mod response;
pub mod service;

#[cfg(test)]
mod testing;

pub use case::{Case, CaseError};
pub use context::{CancellationToken, Context};
pub use error::{ApplicationError, ApplicationResult};
pub use expectation::{
    Expectation, ExpectationError, ExpectationResult, JsonTest, describe, describe_json,
    length_is, nth, status_code_is,
};
pub use ports::{Handler, HandlerError, Response, handler_fn};
pub use response::CachedResponse;
pub use service::Service;
