//! Lazy JSON node
//!
//! A [`Node`] wraps the raw bytes of a single JSON value. Nothing is parsed up
//! front: the value type is classified from the bytes whenever it is asked
//! for, and objects or arrays are decoded one level deep on every traversal.
//! Memory stays proportional to the paths a test actually touches, at the
//! cost of re-decoding a node that is traversed more than once.
//!
//! # Example
//!
//! ```
//! use restit_domain::json::{JsonType, Node};
//!
//! let root = Node::from_bytes(r#"{"items": ["a", "b"], "count": 2}"#);
//! assert_eq!(root.json_type(), JsonType::Object);
//! assert_eq!(root.get("items").len(), 2);
//! assert_eq!(root.get("count").number(), 2.0);
//! assert_eq!(root.get("missing").json_type(), JsonType::Undefined);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::value::RawValue;

#[allow(clippy::expect_used)]
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$")
        .expect("number pattern is a valid regex")
});

/// Returns true if the bytes are exactly one JSON number literal.
///
/// No surrounding whitespace is tolerated.
#[must_use]
pub fn is_json_number(raw: &[u8]) -> bool {
    NUMBER_PATTERN.is_match(raw)
}

/// The type of a JSON value.
///
/// `true` and `false` share [`JsonType::Bool`]. Two extra variants describe
/// values that are not JSON at all: [`JsonType::Undefined`] for a node with no
/// backing bytes and [`JsonType::Unknown`] for bytes matching no production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    /// No backing bytes (missing key, never assigned).
    Undefined,
    /// Backing bytes that are not a recognisable JSON value.
    Unknown,
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// `true` or `false`.
    Bool,
    /// `null`.
    Null,
}

impl JsonType {
    /// Returns the type name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Unknown => "unknown",
            Self::String => "string",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
            Self::Bool => "bool",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lazily typed handle over the raw bytes of one JSON value.
///
/// Nodes are immutable once constructed. Traversal with [`Node::get`] and
/// [`Node::get_n`] returns new nodes owned by the caller.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Node {
    raw: Option<Vec<u8>>,
}

impl Node {
    /// Creates a node with no backing bytes.
    ///
    /// Its type is [`JsonType::Undefined`].
    #[must_use]
    pub const fn undefined() -> Self {
        Self { raw: None }
    }

    /// Creates a node over the given bytes, as they are.
    #[must_use]
    pub fn from_bytes(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }

    /// Reads a stream to the end and wraps the bytes in a node.
    ///
    /// Leading and trailing ASCII whitespace is dropped so that a
    /// pretty-printed or newline-terminated body classifies correctly.
    /// Content that is not JSON is not an error here; it classifies as
    /// [`JsonType::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the stream cannot be read.
    pub fn decode<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(Self::from_bytes(buffer.trim_ascii()))
    }

    /// Classifies the value from its bytes.
    ///
    /// The test order is: no bytes, empty bytes, first byte (`"`, `{`, `[`),
    /// the exact keywords `true`/`false`/`null`, then the number grammar.
    #[must_use]
    pub fn json_type(&self) -> JsonType {
        let Some(raw) = self.raw.as_deref() else {
            return JsonType::Undefined;
        };

        match raw.first() {
            None => JsonType::Unknown,
            Some(b'"') => JsonType::String,
            Some(b'{') => JsonType::Object,
            Some(b'[') => JsonType::Array,
            Some(_) => match raw {
                b"true" | b"false" => JsonType::Bool,
                b"null" => JsonType::Null,
                _ if is_json_number(raw) => JsonType::Number,
                _ => JsonType::Unknown,
            },
        }
    }

    /// Gets the value of an object member.
    ///
    /// A missing key, a non-object node or an object that fails to decode all
    /// yield an undefined node rather than an error. Check
    /// [`Node::json_type`] before relying on the result.
    #[must_use]
    pub fn get(&self, key: &str) -> Self {
        if self.json_type() != JsonType::Object {
            return Self::undefined();
        }

        self.decode_object()
            .and_then(|mut members| members.remove(key))
            .unwrap_or_default()
    }

    /// Gets the nth element of an array, counting from 0.
    ///
    /// Returns `None` for a non-array node or an index out of range.
    #[must_use]
    pub fn get_n(&self, n: usize) -> Option<Self> {
        if self.json_type() != JsonType::Array {
            return None;
        }

        self.decode_array()?.into_iter().nth(n)
    }

    /// Returns the length of the value.
    ///
    /// For a string this is the encoded byte length without the two quote
    /// marks; for an array the element count. Every other type returns `-1`.
    #[must_use]
    pub fn len(&self) -> isize {
        match self.json_type() {
            JsonType::String => self
                .raw
                .as_ref()
                .map_or(-1, |raw| to_isize(raw.len()) - 2),
            JsonType::Array => self.decode_array().map_or(0, |items| to_isize(items.len())),
            _ => -1,
        }
    }

    /// Returns true if the value is an empty string or an empty array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the value as a string, or returns an empty string.
    #[must_use]
    pub fn string(&self) -> String {
        self.unmarshal().unwrap_or_default()
    }

    /// Decodes the value as a number, or returns `0.0`.
    #[must_use]
    pub fn number(&self) -> f64 {
        self.unmarshal().unwrap_or_default()
    }

    /// Decodes the value as a boolean, or returns `false`.
    #[must_use]
    pub fn boolean(&self) -> bool {
        self.unmarshal().unwrap_or_default()
    }

    /// Returns true if the value is `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.json_type() == JsonType::Null
    }

    /// Returns the unmodified backing bytes.
    #[must_use]
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Returns the backing bytes as text, for diagnostics.
    #[must_use]
    pub fn raw_text(&self) -> String {
        self.raw
            .as_deref()
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_default()
    }

    /// Decodes the value into any deserializable type.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not decode into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(self.raw.as_deref().unwrap_or_default())
    }

    fn decode_object(&self) -> Option<HashMap<String, Self>> {
        self.unmarshal().ok()
    }

    fn decode_array(&self) -> Option<Vec<Self>> {
        self.unmarshal().ok()
    }
}

fn to_isize(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(_) => write!(f, "Node({})", self.raw_text()),
            None => f.write_str("Node(undefined)"),
        }
    }
}

impl From<&str> for Node {
    fn from(raw: &str) -> Self {
        Self::from_bytes(raw)
    }
}

impl From<Vec<u8>> for Node {
    fn from(raw: Vec<u8>) -> Self {
        Self::from_bytes(raw)
    }
}

/// Captures the raw text of a value without interpreting it.
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(Self::from_bytes(raw.get()))
    }
}
