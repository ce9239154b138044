//! Live handler implementation using reqwest.
//!
//! This adapter implements the `Handler` port with the blocking reqwest
//! client, so a case run sends a real HTTP request and waits for the
//! response headers. The body is streamed from the connection when an
//! expectation first reads it.

use std::any::Any;
use std::io::Read;
use std::time::{Duration, Instant};

use http::HeaderMap;
use reqwest::blocking::{Client, Response as ReqwestResponse};
use restit_application::{ApplicationError, Context, Handler, HandlerError, Response};
use restit_domain::request::{RequestBody, RequestSpec};
use tracing::debug;

use crate::config::HandlerConfig;

/// Handler sending requests over the network.
///
/// This is the live adapter for RESTit. It wraps `reqwest::blocking::Client`
/// and implements the `Handler` port from the application layer.
#[derive(Debug, Clone)]
pub struct ReqwestHandler {
    client: Client,
    config: HandlerConfig,
}

impl ReqwestHandler {
    /// Creates a handler with [`HandlerConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HandlerError> {
        Self::with_config(HandlerConfig::default())
    }

    /// Creates a handler from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn with_config(config: HandlerConfig) -> Result<Self, HandlerError> {
        let redirect = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(redirect)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| HandlerError::Other(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Creates a handler over a preconfigured client.
    ///
    /// `config` is only used to label errors.
    #[must_use]
    pub const fn with_client(client: Client, config: HandlerConfig) -> Self {
        Self { client, config }
    }

    /// The settings this handler was built with.
    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Headers of the outgoing request, with the body's content type added
    /// unless one is already set.
    fn build_headers(request: &RequestSpec) -> Result<HeaderMap, HandlerError> {
        let mut headers = request.headers.to_header_map()?;
        if let Some(content_type) = body_content_type(&request.body)
            && !headers.contains_key(http::header::CONTENT_TYPE)
        {
            let value = http::HeaderValue::from_str(content_type)
                .map_err(|e| HandlerError::Other(format!("invalid content type: {e}")))?;
            headers.insert(http::header::CONTENT_TYPE, value);
        }
        Ok(headers)
    }

    /// Maps reqwest errors to `HandlerError`.
    ///
    /// `timeout` is the limit the request actually ran under; when it came
    /// from the context deadline the error reports the deadline instead.
    fn map_error(
        &self,
        error: &reqwest::Error,
        ctx: &Context,
        timeout: Duration,
        deadline_bound: bool,
    ) -> HandlerError {
        if error.is_timeout() {
            if let Err(ctx_error) = ctx.check() {
                return HandlerError::Cancelled(ctx_error.to_string());
            }
            if deadline_bound {
                return HandlerError::Cancelled(ApplicationError::DeadlineExceeded.to_string());
            }
            return HandlerError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        if error.is_redirect() {
            return HandlerError::TooManyRedirects {
                max: self.config.max_redirects,
            };
        }
        if error.is_connect() {
            let host = error
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown")
                .to_string();
            return HandlerError::ConnectionFailed(format!("{host}: {error}"));
        }
        HandlerError::Other(error.to_string())
    }
}

fn body_content_type(body: &RequestBody) -> Option<&str> {
    if body.is_empty() {
        None
    } else {
        body.content_type()
    }
}

impl Handler for ReqwestHandler {
    fn handle(
        &self,
        ctx: &Context,
        request: RequestSpec,
    ) -> Result<Box<dyn Response>, HandlerError> {
        ctx.check()
            .map_err(|e| HandlerError::Cancelled(e.to_string()))?;

        let url = request
            .parse_url()
            .map_err(|e| HandlerError::InvalidUrl(e.to_string()))?;
        let headers = Self::build_headers(&request)?;

        let mut builder = self
            .client
            .request(request.method.to_http(), url.clone())
            .headers(headers);
        let deadline = ctx
            .remaining()
            .filter(|remaining| *remaining < self.config.timeout());
        let timeout = deadline.unwrap_or_else(|| self.config.timeout());
        if deadline.is_some() {
            builder = builder.timeout(timeout);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.content);
        }

        let start = Instant::now();
        let response = builder
            .send()
            .map_err(|e| self.map_error(&e, ctx, timeout, deadline.is_some()))?;
        debug!(
            method = %request.method,
            url = %url,
            status = response.status().as_u16(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        Ok(Box::new(HttpResponse::new(response)))
    }
}

/// A live HTTP response; the body streams from the connection once.
#[derive(Debug)]
pub struct HttpResponse {
    inner: ReqwestResponse,
}

impl HttpResponse {
    /// Wraps a reqwest response.
    #[must_use]
    pub const fn new(inner: ReqwestResponse) -> Self {
        Self { inner }
    }

    /// Returns the reqwest response.
    #[must_use]
    pub fn into_inner(self) -> ReqwestResponse {
        self.inner
    }
}

impl Response for HttpResponse {
    fn status_code(&self) -> u16 {
        self.inner.status().as_u16()
    }

    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn body(&mut self) -> Box<dyn Read + '_> {
        Box::new(&mut self.inner)
    }

    fn raw(&self) -> &dyn Any {
        &self.inner
    }
}
