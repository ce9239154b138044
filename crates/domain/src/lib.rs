//! RESTit Domain - Core types
//!
//! This crate defines the pure data model of RESTit: the lazy JSON node that
//! expectations inspect, the contextual error they report, and the request
//! specification a case sends. Nothing here performs I/O beyond reading a
//! caller-supplied stream.

pub mod context_error;
pub mod error;
pub mod json;
pub mod paths;
pub mod request;

pub use context_error::{ContextEntry, ContextError, MESSAGE_KEY};
pub use error::{DomainError, DomainResult};
pub use json::{JsonType, Node, is_json_number};
pub use paths::{Noun, Paths, join_url, validate_base_url};
pub use request::{
    Header, Headers, HttpMethod, QueryParam, QueryParams, RequestBody, RequestBodyKind,
    RequestSpec,
};
