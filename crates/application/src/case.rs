//! Case executor
//!
//! A [`Case`] binds one request to one handler and an ordered list of
//! expectations. [`Case::run`] dispatches the request once, wraps the
//! response in a [`CachedResponse`] and evaluates the expectations in order,
//! stopping at the first failure.

use std::fmt;
use std::sync::Arc;

use restit_domain::{ContextError, request::RequestSpec};
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::Context;
use crate::expectation::Expectation;
use crate::ports::{Handler, HandlerError};
use crate::response::CachedResponse;

/// Errors returned by [`Case::run`].
#[derive(Debug, Error)]
pub enum CaseError {
    /// The case has no request.
    #[error("case.Request is nil")]
    MissingRequest,

    /// The case has no handler.
    #[error("case.Handler is nil")]
    MissingHandler,

    /// The handler could not produce a response.
    #[error(transparent)]
    Dispatch(#[from] HandlerError),

    /// An expectation failed. The error carries the zero-based
    /// `expectation` index and its `desc` ahead of the predicate's own
    /// annotations.
    #[error("{}", .0.log())]
    Expectation(ContextError),
}

impl CaseError {
    /// The annotated error of a failed expectation.
    #[must_use]
    pub const fn context(&self) -> Option<&ContextError> {
        match self {
            Self::Expectation(err) => Some(err),
            _ => None,
        }
    }
}

/// One request, one dispatch, ordered expectations.
#[derive(Default)]
pub struct Case {
    request: Option<RequestSpec>,
    context: Option<Context>,
    handler: Option<Arc<dyn Handler>>,
    expectations: Vec<Box<dyn Expectation>>,
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("request", &self.request)
            .field("context", &self.context)
            .field("handler", &self.handler.is_some())
            .field(
                "expectations",
                &self.expectations.iter().map(|e| e.desc()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Case {
    /// Creates a case sending `request` through `handler`.
    #[must_use]
    pub fn new(request: RequestSpec, handler: Arc<dyn Handler>) -> Self {
        Self {
            request: Some(request),
            handler: Some(handler),
            ..Self::default()
        }
    }

    /// Sets the request.
    #[must_use]
    pub fn with_request(mut self, request: RequestSpec) -> Self {
        self.request = Some(request);
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets the execution context. Without one, the case runs under
    /// [`Context::background`].
    #[must_use]
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Adds a request header value, keeping existing values for the name.
    ///
    /// Does nothing if the case has no request.
    #[must_use]
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(request) = self.request.as_mut() {
            request.headers.add(name, value);
        }
        self
    }

    /// Adds a query parameter to the request URL.
    ///
    /// Does nothing if the case has no request.
    #[must_use]
    pub fn add_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(request) = self.request.as_mut() {
            request.query.add(key, value);
        }
        self
    }

    /// Applies an arbitrary change without breaking the builder chain.
    #[must_use]
    pub fn modify(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }

    /// Appends an expectation.
    #[must_use]
    pub fn expect(mut self, expectation: impl Expectation + 'static) -> Self {
        self.expectations.push(Box::new(expectation));
        self
    }

    /// The request, if set.
    #[must_use]
    pub const fn request(&self) -> Option<&RequestSpec> {
        self.request.as_ref()
    }

    /// Mutable access to the request, if set.
    pub const fn request_mut(&mut self) -> Option<&mut RequestSpec> {
        self.request.as_mut()
    }

    /// Descriptions of the attached expectations, in order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.expectations.iter().map(|e| e.desc())
    }

    /// Dispatches the request and checks every expectation.
    ///
    /// # Errors
    ///
    /// - [`CaseError::MissingRequest`] / [`CaseError::MissingHandler`] before
    ///   anything is sent
    /// - [`CaseError::Dispatch`] if the handler fails; no expectation runs
    /// - [`CaseError::Expectation`] for the first failing expectation; later
    ///   ones do not run
    pub fn run(self) -> Result<CachedResponse, CaseError> {
        let request = self.request.ok_or(CaseError::MissingRequest)?;
        let ctx = self.context.unwrap_or_else(Context::background);
        let handler = self.handler.ok_or(CaseError::MissingHandler)?;

        debug!(
            method = %request.method,
            url = %request.full_url(),
            expectations = self.expectations.len(),
            "dispatching case"
        );
        let mut resp = CachedResponse::new(handler.handle(&ctx, request)?);

        for (index, expectation) in self.expectations.iter().enumerate() {
            debug!(expectation = index, desc = expectation.desc(), "checking expectation");
            if let Err(err) = expectation.check(&ctx, &mut resp) {
                let mut err = ContextError::expand(err);
                err.prepend("desc", expectation.desc());
                err.prepend("expectation", index);
                warn!(
                    expectation = index,
                    desc = expectation.desc(),
                    error = %err.log(),
                    "expectation failed"
                );
                return Err(CaseError::Expectation(err));
            }
        }

        Ok(resp)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expectation::{ExpectationResult, describe, length_is, status_code_is};
    use crate::ports::{Response, handler_fn};
    use crate::testing::StubResponse;
    use pretty_assertions::assert_eq;
    use restit_domain::HttpMethod;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_handler(status: u16, body: &'static str) -> Arc<dyn Handler> {
        Arc::new(handler_fn(move |_ctx, _req| {
            Ok(Box::new(StubResponse::new(status, body)))
        }))
    }

    #[test]
    fn test_missing_request() {
        let err = Case::default()
            .with_handler(echo_handler(200, "{}"))
            .run()
            .unwrap_err();
        assert!(matches!(err, CaseError::MissingRequest));
        assert_eq!(err.to_string(), "case.Request is nil");
    }

    #[test]
    fn test_missing_handler() {
        let err = Case::default()
            .with_request(RequestSpec::get("/posts"))
            .run()
            .unwrap_err();
        assert_eq!(err.to_string(), "case.Handler is nil");
    }

    #[test]
    fn test_dispatch_error_skips_expectations() {
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let handler: Arc<dyn Handler> = Arc::new(handler_fn(|_ctx, _req| {
            Err(HandlerError::ConnectionFailed("refused".into()))
        }));

        let err = Case::new(RequestSpec::get("/posts"), handler)
            .expect(describe("counts", move |_ctx, _resp| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .run()
            .unwrap_err();

        assert!(matches!(
            err,
            CaseError::Dispatch(HandlerError::ConnectionFailed(_))
        ));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fail_fast_reports_index_and_desc() {
        let third_ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&third_ran);

        let err = Case::new(RequestSpec::get("/posts"), echo_handler(404, "{}"))
            .expect(describe("always passes", |_ctx, _resp| Ok(())))
            .expect(status_code_is(200))
            .expect(describe("never runs", move |_ctx, _resp| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .run()
            .unwrap_err();

        assert_eq!(third_ran.load(Ordering::SeqCst), 0);
        let ctx_err = err.context().unwrap();
        assert_eq!(ctx_err.get("expectation"), Some(&json!(1)));
        assert_eq!(ctx_err.get("desc"), Some(&json!("status code is 200")));
        assert_eq!(
            err.to_string(),
            r#"expectation=1 desc="status code is 200" message="expected 200, got 404" ref="header status code""#
        );
    }

    #[test]
    fn test_plain_error_is_wrapped() {
        let err = Case::new(RequestSpec::get("/"), echo_handler(200, "{}"))
            .expect(describe("custom", |_ctx, _resp| Err("boom".into())))
            .run()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"expectation=0 desc="custom" message="boom""#
        );
        assert_eq!(err.context().unwrap().to_string(), "boom");
    }

    #[test]
    fn test_success_returns_cached_response() {
        let mut resp = Case::new(RequestSpec::get("/"), echo_handler(200, r#"{"items":[1,2]}"#))
            .expect(status_code_is(200))
            .expect(length_is("items", 2))
            .expect(length_is("items", 2))
            .run()
            .unwrap();

        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.json().unwrap().get("items").len(), 2);
        assert_eq!(resp.text(), r#"{"items":[1,2]}"#);
    }

    #[test]
    fn test_handler_sees_request_changes_and_context() {
        #[derive(Clone)]
        struct Tenant(&'static str);

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let handler: Arc<dyn Handler> = Arc::new(handler_fn(move |ctx, req| {
            let tenant = ctx.value::<Tenant>().map(|t| t.0);
            let token = req.headers.get("x-token").map(str::to_string);
            *sink.lock().unwrap() = Some((req.full_url(), token, tenant));
            Ok(Box::new(StubResponse::new(204, "")))
        }));

        let request = RequestSpec::json(HttpMethod::Post, "/posts", Some(&json!({}))).unwrap();
        let resp = Case::new(request, handler)
            .add_header("X-Token", "secret")
            .add_query("page", "2")
            .modify(|case| case.add_query("size", "10"))
            .with_context(Context::background().with_value(Tenant("acme")))
            .run()
            .unwrap();

        assert_eq!(resp.status_code(), 204);
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some((
                "/posts?page=2&size=10".to_string(),
                Some("secret".to_string()),
                Some("acme")
            ))
        );
    }

    #[test]
    fn test_expectations_share_cached_body() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let check = move |_ctx: &Context, resp: &mut dyn Response| -> ExpectationResult {
            let node = resp.json()?;
            if node.get("ok").boolean() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        };

        Case::new(RequestSpec::get("/"), echo_handler(200, r#"{"ok":true}"#))
            .expect(describe("first read", check.clone()))
            .expect(describe("second read", check))
            .run()
            .unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_lists_expectations() {
        let case = Case::default().expect(status_code_is(201));
        assert_eq!(case.descriptions().collect::<Vec<_>>(), vec!["status code is 201"]);
        assert!(format!("{case:?}").contains("status code is 201"));
    }
}
