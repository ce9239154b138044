//! Contextual error
//!
//! An ordered list of key-value annotations that travels up the call chain
//! while a failure is being described. Each layer adds what it knows
//! (which expectation, which field, the raw body) without losing what the
//! layers below already recorded.

use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

/// Key holding the human readable error text.
pub const MESSAGE_KEY: &str = "message";

const FALLBACK_MESSAGE: &str = "error";

/// One annotation in a [`ContextError`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    /// Annotation key, unique within the error.
    pub key: String,
    /// Annotation value.
    pub value: Value,
    /// Sort weight used by [`ContextError::log`]; lower renders first.
    pub weight: i32,
}

/// An error carrying an ordered set of unique key-value annotations.
///
/// Re-adding a key removes its previous position first, so the latest
/// `append` or `prepend` decides where the key renders.
///
/// ```
/// use restit_domain::ContextError;
///
/// let mut err = ContextError::new("expected 200, got 404");
/// err.prepend("desc", "status code is 200");
/// err.prepend("expectation", 1);
///
/// assert_eq!(err.to_string(), "expected 200, got 404");
/// assert_eq!(
///     err.log(),
///     r#"expectation=1 desc="status code is 200" message="expected 200, got 404""#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextError {
    entries: Vec<ContextEntry>,
}

impl ContextError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let mut err = Self::empty();
        err.append(MESSAGE_KEY, message.into());
        err
    }

    /// Creates an error without any annotation.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Turns any boxed error into a `ContextError`.
    ///
    /// An error that already is a `ContextError` is returned with its
    /// annotations intact; anything else becomes a new error whose message
    /// is the original error's text.
    #[must_use]
    pub fn expand(err: Box<dyn StdError + Send + Sync>) -> Self {
        match err.downcast::<Self>() {
            Ok(ctx_err) => *ctx_err,
            Err(other) => Self::new(other.to_string()),
        }
    }

    /// Adds a key-value pair at the end.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.append_weighted(key, value, 0);
    }

    /// Adds a key-value pair at the end with an explicit sort weight.
    pub fn append_weighted(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        weight: i32,
    ) {
        let key = key.into();
        self.delete(&key);
        self.entries.push(ContextEntry {
            key,
            value: value.into(),
            weight,
        });
    }

    /// Adds a key-value pair at the beginning.
    pub fn prepend(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.delete(&key);
        self.entries.insert(
            0,
            ContextEntry {
                key,
                value: value.into(),
                weight: 0,
            },
        );
    }

    /// Chaining form of [`ContextError::append`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.append(key, value);
        self
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Removes the entry stored under `key`, if any.
    pub fn delete(&mut self, key: &str) {
        self.entries.retain(|entry| entry.key != key);
    }

    /// Returns the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders every entry as `key=value`, space separated.
    ///
    /// Entries are stably sorted by weight, so equal weights keep their
    /// current order. String values render quoted and escaped; numbers,
    /// booleans and `null` render bare.
    #[must_use]
    pub fn log(&self) -> String {
        let mut ordered: Vec<&ContextEntry> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| entry.weight);
        ordered
            .iter()
            .map(|entry| format!("{}={}", entry.key, entry.value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns the message, or `"error"` when it is absent or not a string.
    #[must_use]
    pub fn message(&self) -> &str {
        match self.get(MESSAGE_KEY) {
            Some(Value::String(message)) => message.as_str(),
            _ => FALLBACK_MESSAGE,
        }
    }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl StdError for ContextError {}
