//! Live handler configuration
//!
//! Settings for [`ReqwestHandler`](crate::adapters::ReqwestHandler). Values
//! come from code, from JSON, or from `RESTIT_*` environment variables;
//! anything unset keeps its default.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "RESTIT_TIMEOUT_MS";
/// Environment variable holding the `User-Agent` header value.
pub const ENV_USER_AGENT: &str = "RESTIT_USER_AGENT";
/// Environment variable holding the redirect limit.
pub const ENV_MAX_REDIRECTS: &str = "RESTIT_MAX_REDIRECTS";

/// Errors raised while loading a [`HandlerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// A JSON document could not be decoded.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings of the live HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Redirects followed before giving up; `0` disables following.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Accept TLS certificates that fail verification.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

const fn default_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("restit/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_max_redirects() -> usize {
    10
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            accept_invalid_certs: false,
        }
    }
}

impl HandlerConfig {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_var(ENV_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_USER_AGENT) {
            config.user_agent = value;
        }
        if let Some(value) = lookup(ENV_MAX_REDIRECTS) {
            config.max_redirects = parse_var(ENV_MAX_REDIRECTS, value)?;
        }
        Ok(config)
    }

    /// Decodes a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}
