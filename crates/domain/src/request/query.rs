//! Query parameter types

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// A query parameter key-value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    /// The parameter key
    pub key: String,
    /// The parameter value
    pub value: String,
}

impl QueryParam {
    /// Creates a new query parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Query parameters of a request.
///
/// A query string taken from a URL is kept byte for byte and sent as is;
/// parameters added afterwards are form-encoded and appended after it.
/// Lookups see both, in order; keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QueryParamsRepr")]
pub struct QueryParams {
    /// Verbatim query string, without the leading `?`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    raw: String,
    /// Parameters added after construction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    added: Vec<QueryParam>,
    /// Decoded pairs of `raw`, for lookups
    #[serde(skip)]
    parsed: Vec<QueryParam>,
}

#[derive(Deserialize)]
struct QueryParamsRepr {
    #[serde(default)]
    raw: String,
    #[serde(default)]
    added: Vec<QueryParam>,
}

impl From<QueryParamsRepr> for QueryParams {
    fn from(repr: QueryParamsRepr) -> Self {
        let mut params = Self::parse(&repr.raw);
        params.added = repr.added;
        params
    }
}

impl QueryParams {
    /// Creates an empty query parameter collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raw: String::new(),
            added: Vec::new(),
            parsed: Vec::new(),
        }
    }

    /// Wraps a query string taken from a URL.
    ///
    /// A leading `?` is ignored. The rest is kept verbatim for
    /// [`QueryParams::encode`] and decoded as
    /// `application/x-www-form-urlencoded` for lookups.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let raw = query.strip_prefix('?').unwrap_or(query);
        let parsed = form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| QueryParam::new(key, value))
            .collect();
        Self {
            raw: raw.to_string(),
            added: Vec::new(),
            parsed,
        }
    }

    /// Adds a query parameter to the collection.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.added.push(QueryParam::new(key, value));
    }

    /// Returns the first value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter().find(|p| p.key == key).map(|p| p.value.as_str())
    }

    /// Iterates over every parameter, URL ones first.
    pub fn iter(&self) -> impl Iterator<Item = &QueryParam> {
        self.parsed.iter().chain(&self.added)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parsed.len() + self.added.len()
    }

    /// Returns true if there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.added.is_empty()
    }

    /// Returns the query string, without the leading `?`.
    ///
    /// The URL's own query comes first, unchanged, followed by the encoded
    /// added parameters.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for param in &self.added {
            serializer.append_pair(&param.key, &param.value);
        }
        let added = serializer.finish();
        match (self.raw.is_empty(), added.is_empty()) {
            (_, true) => self.raw.clone(),
            (true, false) => added,
            (false, false) => format!("{}&{added}", self.raw),
        }
    }
}

impl FromIterator<QueryParam> for QueryParams {
    fn from_iter<T: IntoIterator<Item = QueryParam>>(iter: T) -> Self {
        Self {
            added: iter.into_iter().collect(),
            ..Self::new()
        }
    }
}
