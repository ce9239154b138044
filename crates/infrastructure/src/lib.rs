//! RESTit Infrastructure - Handler adapters
//!
//! This crate provides the concrete handlers behind the application layer's
//! `Handler` port: a live one sending requests with reqwest and an
//! in-process recorder. It also carries the live handler's configuration
//! and the tracing setup used by test binaries.

pub mod adapters;
pub mod config;
pub mod error;
pub mod telemetry;

pub use adapters::{HttpResponse, Recorder, RecorderHandler, RecorderResponse, ReqwestHandler};
pub use config::{ConfigError, HandlerConfig};
pub use error::{InfrastructureError, InfrastructureResult};
pub use telemetry::init_tracing;

use http::Request;
use restit_application::{Context, Service};

/// Creates a service sending live requests with default settings.
///
/// # Errors
///
/// Returns an error if the client cannot be built or `base_url` is invalid.
pub fn http_service(base_url: impl Into<String>) -> InfrastructureResult<Service> {
    http_service_with_config(base_url, HandlerConfig::default())
}

/// Creates a service sending live requests with `config`.
///
/// # Errors
///
/// Returns an error if the client cannot be built or `base_url` is invalid.
pub fn http_service_with_config(
    base_url: impl Into<String>,
    config: HandlerConfig,
) -> InfrastructureResult<Service> {
    let handler = ReqwestHandler::with_config(config)?;
    Ok(Service::new(base_url, handler)?)
}

/// Creates a live service configured from the `RESTIT_*` environment
/// variables.
///
/// # Errors
///
/// Returns an error if a variable does not parse, the client cannot be
/// built or `base_url` is invalid.
pub fn http_service_from_env(base_url: impl Into<String>) -> InfrastructureResult<Service> {
    http_service_from_lookup(base_url, |var| std::env::var(var).ok())
}

/// Creates a live service configured through `lookup`, which maps a
/// variable name to its value.
///
/// # Errors
///
/// Returns an error if a variable does not parse, the client cannot be
/// built or `base_url` is invalid.
pub fn http_service_from_lookup(
    base_url: impl Into<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> InfrastructureResult<Service> {
    http_service_with_config(base_url, HandlerConfig::from_lookup(lookup)?)
}

/// Creates a service answered in-process by `service`.
///
/// # Errors
///
/// Returns an error if `base_url` is invalid.
pub fn recorder_service<F>(
    base_url: impl Into<String>,
    service: F,
) -> InfrastructureResult<Service>
where
    F: Fn(&Context, &Request<Vec<u8>>, &mut Recorder) + Send + Sync + 'static,
{
    Ok(Service::new(base_url, RecorderHandler::new(service))?)
}
