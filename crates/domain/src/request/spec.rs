//! Request specification type

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{Headers, HttpMethod, QueryParams, RequestBody};
use crate::error::{DomainError, DomainResult};
use crate::paths::scheme_end;

/// Complete specification for an HTTP request sent by a case.
///
/// The URL is kept without its query string; the query lives in
/// [`RequestSpec::query`] and is re-attached by [`RequestSpec::full_url`],
/// unchanged apart from parameters added later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Unique identifier for this request
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL, absolute or path-only, without query string
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Query parameters
    #[serde(default)]
    pub query: QueryParams,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
}

impl RequestSpec {
    /// Creates a request without a body.
    ///
    /// A query string in `url` is split off into [`RequestSpec::query`].
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        let url = url.into();
        let (url, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), QueryParams::parse(query)),
            None => (url, QueryParams::new()),
        };
        Self {
            id: Uuid::now_v7(),
            method,
            url,
            headers: Headers::new(),
            query,
            body: RequestBody::none(),
        }
    }

    /// Creates a GET request with the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a request whose body is the JSON encoding of `payload`.
    ///
    /// With no payload the body stays empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(
        method: HttpMethod,
        url: impl Into<String>,
        payload: Option<&T>,
    ) -> DomainResult<Self> {
        let mut spec = Self::new(method, url);
        if let Some(payload) = payload {
            spec.body = RequestBody::json_payload(payload)?;
            if let Some(content_type) = spec.body.content_type() {
                spec.headers.set("Content-Type", content_type.to_string());
            }
        }
        Ok(spec)
    }

    /// Sets a header, replacing existing values.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add(key, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Returns the URL with the encoded query string attached.
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, self.query.encode())
        }
    }

    /// Parses the full URL as an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or relative.
    pub fn parse_url(&self) -> DomainResult<Url> {
        let full = self.full_url();
        Url::parse(&full).map_err(|e| DomainError::InvalidUrl(format!("{full}: {e}")))
    }

    /// Returns the path component of the URL.
    #[must_use]
    pub fn path(&self) -> &str {
        match scheme_end(&self.url) {
            Some(end) => {
                let rest = &self.url[end + 3..];
                rest.find('/').map_or("/", |i| &rest[i..])
            }
            None => &self.url,
        }
    }
}
