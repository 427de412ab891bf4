//! Error types for the tutor backend.
//!
//! Each subsystem gets its own enum so callers can tell a transport failure
//! from a validation failure without string matching:
//! - [`LlmError`]: chat-completions calls
//! - [`ScrapeError`]: article fetching (structural absence is *not* an error)
//! - [`QuizError`]: quiz assembly outcomes the caller must surface
//! - [`ConfigError`]: start-up configuration

use std::path::PathBuf;

/// Failures talking to the OpenAI-compatible chat-completions API.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A required setting (usually the API key) is missing.
    #[error("LLM not configured: {0}")]
    NotConfigured(&'static str),

    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code returned by the provider.
        status: reqwest::StatusCode,
        /// Response body, clipped for logging.
        body: String,
    },

    /// The provider's envelope could not be decoded.
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider returned no choices or an empty message.
    #[error("empty response")]
    EmptyChoices,
}

/// Failures fetching an article. A page that loads but does not match the
/// layout is reported as `Ok(None)` by the extractor, not through this type.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The URL could not be parsed.
    #[error("invalid article URL '{url}': {source}")]
    InvalidUrl {
        /// The URL as supplied by the caller.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },

    /// Only http and https are fetched.
    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    /// Network failure or non-success HTTP status.
    #[error("failed to fetch article: {0}")]
    Request(#[from] reqwest::Error),
}

/// Quiz assembly outcomes that are returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    /// No learned entries were supplied; no model calls were made.
    #[error("At least one learned word is required to build a quiz.")]
    EmptyInput,

    /// Every attempt was rejected.
    #[error("The AI could not generate a quiz after {attempts} attempts. Please try again shortly.")]
    Exhausted {
        /// Number of attempts consumed.
        attempts: usize,
    },
}

/// Start-up configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file '{path}': {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`crate::config::Config`].
    #[error("invalid YAML in config file '{path}': {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
