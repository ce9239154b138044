//! HTTP Request body types

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// The kind of request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBodyKind {
    /// No body
    #[default]
    None,
    /// Raw body with an explicit content type
    Raw {
        /// The content type (e.g., "application/json", "text/plain")
        content_type: String,
    },
}

/// HTTP request body with content and type information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestBody {
    /// The kind of body
    pub kind: RequestBodyKind,
    /// The body content
    #[serde(default)]
    pub content: Vec<u8>,
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: RequestBodyKind::None,
            content: Vec::new(),
        }
    }

    /// Creates a raw body with the given content type.
    #[must_use]
    pub fn raw(content_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: RequestBodyKind::Raw {
                content_type: content_type.into(),
            },
            content: content.into(),
        }
    }

    /// Creates a JSON body from already encoded text.
    #[must_use]
    pub fn json(content: impl Into<Vec<u8>>) -> Self {
        Self::raw(mime::APPLICATION_JSON.as_ref(), content)
    }

    /// Encodes a payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn json_payload<T: Serialize + ?Sized>(payload: &T) -> DomainResult<Self> {
        let content = serde_json::to_vec(payload)
            .map_err(|e| DomainError::InvalidPayload(e.to_string()))?;
        Ok(Self::json(content))
    }

    /// Creates a plain text body.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::raw(mime::TEXT_PLAIN_UTF_8.as_ref(), content.into())
    }

    /// Returns whether the body is empty or none.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, RequestBodyKind::None) || self.content.is_empty()
    }

    /// Returns the content type if applicable.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match &self.kind {
            RequestBodyKind::None => None,
            RequestBodyKind::Raw { content_type } => Some(content_type),
        }
    }
}
