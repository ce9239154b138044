//! Path and noun helpers for RESTful resources
//!
//! URLs are joined with slash-cleaning semantics: empty segments are dropped,
//! `.` and `..` are resolved, and duplicate or trailing slashes disappear. Both
//! absolute URLs (`http://host:1234/api`) and path-only bases (`/api`) are
//! accepted; the scheme, authority, query and fragment are left untouched.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Singular and plural names of a resource (e.g. `post` / `posts`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noun {
    singular: String,
    plural: String,
}

impl Noun {
    /// Creates a noun. Use the same word twice if the API does not
    /// distinguish singular and plural paths.
    #[must_use]
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    /// Path segment addressing a single entity.
    #[must_use]
    pub fn singular(&self) -> &str {
        &self.singular
    }

    /// Path segment addressing the whole collection.
    #[must_use]
    pub fn plural(&self) -> &str {
        &self.plural
    }
}

/// Resolves singular and plural resource paths below a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base: BaseUrl,
    noun: Noun,
}

impl Paths {
    /// Creates paths for `noun` below `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` looks absolute but is not a valid URL.
    pub fn new(base: &str, noun: Noun) -> DomainResult<Self> {
        Ok(Self {
            base: BaseUrl::parse(base)?,
            noun,
        })
    }

    /// Returns the noun.
    #[must_use]
    pub const fn noun(&self) -> &Noun {
        &self.noun
    }

    /// URL of a single entity, with `extra` segments appended
    /// (e.g. `/api/post/123`).
    #[must_use]
    pub fn singular(&self, extra: &[&str]) -> String {
        self.base.join(self.noun.singular(), extra)
    }

    /// URL of the collection, with `extra` segments appended
    /// (e.g. `/api/posts/someUser`).
    #[must_use]
    pub fn plural(&self, extra: &[&str]) -> String {
        self.base.join(self.noun.plural(), extra)
    }
}

/// Checks that `base` can be used as a base URL.
///
/// Path-only bases are always accepted.
///
/// # Errors
///
/// Returns an error if `base` looks absolute but is not a valid URL.
pub fn validate_base_url(base: &str) -> DomainResult<()> {
    BaseUrl::parse(base).map(|_| ())
}

/// Appends `segments` to the path of `base`.
///
/// With no segments the base is returned unchanged.
///
/// # Errors
///
/// Returns an error if `base` looks absolute but is not a valid URL.
pub fn join_url(base: &str, segments: &[&str]) -> DomainResult<String> {
    if segments.is_empty() {
        return Ok(base.to_string());
    }
    let base = BaseUrl::parse(base)?;
    Ok(base.join("", segments))
}

/// Joins path elements with `/` and cleans the result.
///
/// Empty elements are ignored; if every element is empty the result is empty.
#[must_use]
pub fn join_path<'a>(elements: impl IntoIterator<Item = &'a str>) -> String {
    let joined = elements
        .into_iter()
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        joined
    } else {
        clean_path(&joined)
    }
}

/// Returns the shortest path equivalent to `path` by lexical processing.
#[must_use]
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}

/// Position of the `://` after a leading scheme.
///
/// A `://` that follows the first `/`, `?` or `#` belongs to the path or
/// query of a path-only URL and does not count.
pub(crate) fn scheme_end(raw: &str) -> Option<usize> {
    let end = raw.find("://")?;
    let first_delimiter = raw.find(['/', '?', '#']).unwrap_or(raw.len());
    (end < first_delimiter).then_some(end)
}

/// A URL split around its path so the path can be rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BaseUrl {
    /// `scheme://authority`, empty for path-only URLs
    origin: String,
    path: String,
    /// `?query#fragment`, possibly empty
    suffix: String,
}

impl BaseUrl {
    fn parse(raw: &str) -> DomainResult<Self> {
        let (origin, rest) = match scheme_end(raw) {
            Some(end) => {
                Url::parse(raw).map_err(|e| DomainError::InvalidUrl(format!("{raw}: {e}")))?;
                let after = &raw[end + 3..];
                let authority_len = after.find(['/', '?', '#']).unwrap_or(after.len());
                let split = end + 3 + authority_len;
                (&raw[..split], &raw[split..])
            }
            None => ("", raw),
        };
        let path_len = rest.find(['?', '#']).unwrap_or(rest.len());
        Ok(Self {
            origin: origin.to_string(),
            path: rest[..path_len].to_string(),
            suffix: rest[path_len..].to_string(),
        })
    }

    fn join(&self, noun: &str, extra: &[&str]) -> String {
        let path = join_path(
            std::iter::once(self.path.as_str())
                .chain(std::iter::once(noun))
                .chain(extra.iter().copied()),
        );
        let separator = if !self.origin.is_empty() && !path.is_empty() && !path.starts_with('/') {
            "/"
        } else {
            ""
        };
        format!("{}{separator}{path}{}", self.origin, self.suffix)
    }
}
