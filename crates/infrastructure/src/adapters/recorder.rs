//! In-process recorder handler.
//!
//! [`RecorderHandler`] serves each request by calling a function directly,
//! without a network. The function writes its answer into a [`Recorder`],
//! which becomes the response.

use std::any::Any;
use std::fmt;
use std::io::{self, Cursor, Read, Write};

use http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use restit_application::{Context, Handler, HandlerError, Response};
use restit_domain::request::RequestSpec;

/// Captures the status, headers and body written by a service function.
///
/// The status defaults to 200 when the function never sets one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Recorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code. Only the first call takes effect.
    pub fn write_status(&mut self, status: StatusCode) {
        self.status.get_or_insert(status);
    }

    /// Mutable access to the response headers.
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Appends a header value.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Serializes `value` as the JSON body and sets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn write_json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        serde_json::to_writer(&mut *self, value).map_err(io::Error::other)
    }

    /// The recorded status, 200 if none was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// The recorded headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The recorded body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Response built from a finished [`Recorder`].
///
/// Like a network response its body can be read once; [`Response::raw`]
/// exposes the recorder with the full body.
pub struct RecorderResponse {
    recorded: Recorder,
    body: Cursor<Vec<u8>>,
}

impl RecorderResponse {
    /// Turns a recorder into a response.
    #[must_use]
    pub fn new(recorded: Recorder) -> Self {
        let body = Cursor::new(recorded.body.clone());
        Self { recorded, body }
    }

    /// The recorder this response was built from.
    #[must_use]
    pub const fn recorder(&self) -> &Recorder {
        &self.recorded
    }
}

impl fmt::Debug for RecorderResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderResponse")
            .field("status", &self.recorded.status())
            .field("position", &self.body.position())
            .finish_non_exhaustive()
    }
}

impl Response for RecorderResponse {
    fn status_code(&self) -> u16 {
        self.recorded.status().as_u16()
    }

    fn headers(&self) -> &HeaderMap {
        &self.recorded.headers
    }

    fn body(&mut self) -> Box<dyn Read + '_> {
        Box::new(&mut self.body)
    }

    fn raw(&self) -> &dyn Any {
        &self.recorded
    }
}

/// Serves requests in-process through a service function.
///
/// The request reaches the function as an `http::Request<Vec<u8>>`, with
/// the query string attached to its URI.
pub struct RecorderHandler<F> {
    service: F,
}

impl<F> fmt::Debug for RecorderHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderHandler").finish_non_exhaustive()
    }
}

impl<F> RecorderHandler<F>
where
    F: Fn(&Context, &Request<Vec<u8>>, &mut Recorder) + Send + Sync,
{
    /// Wraps a service function.
    #[must_use]
    pub const fn new(service: F) -> Self {
        Self { service }
    }

    /// Converts a request specification to an `http::Request`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable URL or invalid headers.
    pub fn to_http_request(request: RequestSpec) -> Result<Request<Vec<u8>>, HandlerError> {
        let headers = request.headers.to_header_map()?;
        let content_type = (!request.body.is_empty())
            .then(|| request.body.content_type().map(str::to_string))
            .flatten();
        let mut http_request = Request::builder()
            .method(request.method.to_http())
            .uri(request.full_url())
            .body(request.body.content)
            .map_err(|e| HandlerError::InvalidUrl(e.to_string()))?;
        *http_request.headers_mut() = headers;
        if let Some(content_type) = content_type
            && !http_request.headers().contains_key(http::header::CONTENT_TYPE)
        {
            let value = HeaderValue::from_str(&content_type)
                .map_err(|e| HandlerError::Other(format!("invalid content type: {e}")))?;
            http_request
                .headers_mut()
                .insert(http::header::CONTENT_TYPE, value);
        }
        Ok(http_request)
    }
}

impl<F> Handler for RecorderHandler<F>
where
    F: Fn(&Context, &Request<Vec<u8>>, &mut Recorder) + Send + Sync,
{
    fn handle(
        &self,
        ctx: &Context,
        request: RequestSpec,
    ) -> Result<Box<dyn Response>, HandlerError> {
        let http_request = Self::to_http_request(request)?;
        let mut recorder = Recorder::new();
        (self.service)(ctx, &http_request, &mut recorder);
        Ok(Box::new(RecorderResponse::new(recorder)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use restit_domain::{HttpMethod, RequestBody};
    use serde_json::json;

    fn echo(_ctx: &Context, req: &Request<Vec<u8>>, rec: &mut Recorder) {
        rec.write_status(StatusCode::CREATED);
        let content_type = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        rec.write_json(&json!({
            "method": req.method().as_str(),
            "uri": req.uri().to_string(),
            "content_type": content_type,
            "body": String::from_utf8_lossy(req.body()),
        }))
        .unwrap();
    }

    #[test]
    fn test_status_defaults_to_ok() {
        let mut rec = Recorder::new();
        rec.write_all(b"hi").unwrap();
        rec.write_status(StatusCode::NOT_FOUND);
        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.body(), b"hi");
    }

    #[test]
    fn test_first_status_wins() {
        let mut rec = Recorder::new();
        rec.write_status(StatusCode::ACCEPTED);
        rec.write_status(StatusCode::BAD_REQUEST);
        assert_eq!(rec.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_request_reaches_service() {
        let handler = RecorderHandler::new(echo);
        let request = RequestSpec::new(HttpMethod::Post, "http://localhost/posts?draft=1")
            .with_body(RequestBody::json(r#"{"id":"p1"}"#));

        let mut resp = handler.handle(&Context::background(), request).unwrap();
        assert_eq!(resp.status_code(), 201);
        assert_eq!(resp.headers()["content-type"], "application/json");

        let node = resp.json().unwrap();
        assert_eq!(node.get("method").string(), "POST");
        assert_eq!(node.get("uri").string(), "http://localhost/posts?draft=1");
        assert_eq!(node.get("content_type").string(), "application/json");
        assert_eq!(node.get("body").string(), r#"{"id":"p1"}"#);
    }

    #[test]
    fn test_body_reads_once_raw_keeps_recorder() {
        let handler = RecorderHandler::new(
            |_ctx: &Context, _req: &Request<Vec<u8>>, rec: &mut Recorder| {
                rec.write_all(b"payload").unwrap();
            },
        );
        let mut resp = handler
            .handle(&Context::background(), RequestSpec::get("/anything"))
            .unwrap();

        let mut first = String::new();
        resp.body().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        resp.body().read_to_string(&mut second).unwrap();
        assert_eq!(first, "payload");
        assert_eq!(second, "");

        let recorder = resp.raw().downcast_ref::<Recorder>().unwrap();
        assert_eq!(recorder.body(), b"payload");
    }

    #[test]
    fn test_invalid_uri_is_rejected() {
        let handler = RecorderHandler::new(echo);
        let result = handler.handle(
            &Context::background(),
            RequestSpec::get("http://exa mple/"),
        );
        assert!(matches!(result, Err(HandlerError::InvalidUrl(_))));
    }
}
