//! Expectations evaluated against a case's response
//!
//! An [`Expectation`] is a named predicate over a [`Response`]. A
//! [`JsonTest`] is the same over a single JSON [`Node`]. The built-in
//! constructors cover status codes, array lengths and per-item checks; use
//! [`describe`] and [`describe_json`] for anything else.
//!
//! Predicates report failure with any boxed error. Returning a
//! [`ContextError`] keeps the annotations (`ref`, `body`, ...) through to the
//! case error.

use std::error::Error as StdError;
use std::fmt;

use restit_domain::{ContextError, JsonType, Node};

use crate::context::Context;
use crate::ports::Response;

/// Error type returned by predicates.
pub type ExpectationError = Box<dyn StdError + Send + Sync>;

/// Result type returned by predicates.
pub type ExpectationResult = Result<(), ExpectationError>;

/// A named predicate over a response.
pub trait Expectation: Send + Sync {
    /// Human-readable description, reported when the predicate fails.
    fn desc(&self) -> &str;

    /// Runs the predicate.
    ///
    /// The response body may be read any number of times.
    ///
    /// # Errors
    ///
    /// Returns the reason the response does not meet the expectation.
    fn check(&self, ctx: &Context, resp: &mut dyn Response) -> ExpectationResult;
}

/// A named predicate over one JSON node.
pub trait JsonTest: Send + Sync {
    /// Human-readable description, reported when the test fails.
    fn desc(&self) -> &str;

    /// Runs the test.
    ///
    /// # Errors
    ///
    /// Returns the reason the node does not pass.
    fn check(&self, node: &Node) -> ExpectationResult;
}

/// Expectation built from a description and a closure.
pub struct Described<F> {
    desc: String,
    check: F,
}

impl<F> fmt::Debug for Described<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Described")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// Builds an expectation from a description and a predicate.
///
/// ```
/// use restit_application::expectation::{Expectation, describe};
///
/// let not_teapot = describe("not a teapot", |_ctx, resp| {
///     if resp.status_code() == 418 {
///         return Err("server is a teapot".into());
///     }
///     Ok(())
/// });
/// assert_eq!(not_teapot.desc(), "not a teapot");
/// ```
pub fn describe<F>(desc: impl Into<String>, check: F) -> Described<F>
where
    F: Fn(&Context, &mut dyn Response) -> ExpectationResult + Send + Sync,
{
    Described {
        desc: desc.into(),
        check,
    }
}

impl<F> Expectation for Described<F>
where
    F: Fn(&Context, &mut dyn Response) -> ExpectationResult + Send + Sync,
{
    fn desc(&self) -> &str {
        &self.desc
    }

    fn check(&self, ctx: &Context, resp: &mut dyn Response) -> ExpectationResult {
        (self.check)(ctx, resp)
    }
}

/// JSON test built from a description and a closure.
pub struct DescribedJson<F> {
    desc: String,
    check: F,
}

impl<F> fmt::Debug for DescribedJson<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescribedJson")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// Builds a JSON test from a description and a predicate.
pub fn describe_json<F>(desc: impl Into<String>, check: F) -> DescribedJson<F>
where
    F: Fn(&Node) -> ExpectationResult + Send + Sync,
{
    DescribedJson {
        desc: desc.into(),
        check,
    }
}

impl<F> JsonTest for DescribedJson<F>
where
    F: Fn(&Node) -> ExpectationResult + Send + Sync,
{
    fn desc(&self) -> &str {
        &self.desc
    }

    fn check(&self, node: &Node) -> ExpectationResult {
        (self.check)(node)
    }
}

/// Expects an exact HTTP status code.
#[derive(Debug, Clone)]
pub struct StatusCodeIs {
    code: u16,
    desc: String,
}

/// Expects the response status code to equal `code`.
#[must_use]
pub fn status_code_is(code: u16) -> StatusCodeIs {
    StatusCodeIs {
        code,
        desc: format!("status code is {code}"),
    }
}

impl Expectation for StatusCodeIs {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn check(&self, _ctx: &Context, resp: &mut dyn Response) -> ExpectationResult {
        let have = resp.status_code();
        if have != self.code {
            return Err(ContextError::new(format!("expected {}, got {have}", self.code))
                .with("ref", "header status code")
                .into());
        }
        Ok(())
    }
}

/// Expects an array field of the root object to have a given length.
#[derive(Debug, Clone)]
pub struct LengthIs {
    field: String,
    length: usize,
    desc: String,
}

/// Expects the root object's `field` to be an array of `length` items.
#[must_use]
pub fn length_is(field: impl Into<String>, length: usize) -> LengthIs {
    let field = field.into();
    let desc = format!("{field:?} has length {length}");
    LengthIs {
        field,
        length,
        desc,
    }
}

impl Expectation for LengthIs {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn check(&self, _ctx: &Context, resp: &mut dyn Response) -> ExpectationResult {
        let root = decode_root(resp)?;
        let root_type = root.json_type();
        if root_type != JsonType::Object {
            return Err(
                ContextError::new(format!("expected root to be object, got {root_type}"))
                    .with("ref", "root")
                    .with("body", root.raw_text())
                    .into(),
            );
        }

        let field = root.get(&self.field);
        let field_type = field.json_type();
        if field_type != JsonType::Array {
            return Err(ContextError::new(format!(
                "expected {:?} to be array, got {field_type}",
                self.field
            ))
            .with("ref", self.field.as_str())
            .with("body", root.raw_text())
            .into());
        }

        let have = field.len();
        if usize::try_from(have).ok() != Some(self.length) {
            return Err(ContextError::new(format!(
                "expected {:?} to be length {}, got {have}",
                self.field, self.length
            ))
            .with("ref", self.field.as_str())
            .into());
        }
        Ok(())
    }
}

/// Runs JSON tests against one item of an array field.
///
/// Built with [`nth`], then [`Nth::of`] and one or more [`Nth::is`].
pub struct Nth {
    n: usize,
    field: String,
    desc: String,
    tests: Vec<Box<dyn JsonTest>>,
}

impl fmt::Debug for Nth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nth")
            .field("n", &self.n)
            .field("field", &self.field)
            .field("tests", &self.tests.len())
            .finish()
    }
}

/// Starts an expectation on item `n` (zero-based) of an array field.
#[must_use]
pub fn nth(n: usize) -> Nth {
    Nth {
        n,
        field: String::new(),
        desc: format!("item {n}"),
        tests: Vec::new(),
    }
}

impl Nth {
    /// Names the array field of the root object.
    #[must_use]
    pub fn of(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self.desc = format!("item {} of {:?}", self.n, self.field);
        self
    }

    /// Adds a test the item must pass. Tests run in the order added.
    #[must_use]
    pub fn is(mut self, test: impl JsonTest + 'static) -> Self {
        self.tests.push(Box::new(test));
        self
    }
}

impl Expectation for Nth {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn check(&self, _ctx: &Context, resp: &mut dyn Response) -> ExpectationResult {
        let root = decode_root(resp)?;

        let field = root.get(&self.field);
        match field.json_type() {
            JsonType::Array => {}
            JsonType::Undefined => {
                return Err(ContextError::new(format!("field {:?} undefined", self.field)).into());
            }
            other => {
                return Err(ContextError::new(format!(
                    "field {:?} is not an array, is {other} ({})",
                    self.field,
                    field.raw_text()
                ))
                .into());
            }
        }

        let item = field.get_n(self.n).ok_or_else(|| {
            ContextError::new(format!("{} does not have item {}", self.field, self.n))
        })?;

        for test in &self.tests {
            test.check(&item).map_err(|e| {
                ContextError::new(format!("failed \"{}\" ({e})", test.desc()))
                    .with("item", item.raw_text())
            })?;
        }
        Ok(())
    }
}

fn decode_root(resp: &mut dyn Response) -> Result<Node, ContextError> {
    resp.json()
        .map_err(|e| ContextError::new(format!("error decoding body to JSON ({e})")))
}
