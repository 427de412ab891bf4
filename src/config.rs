//! Service configuration.
//!
//! Settings come from an optional YAML file; anything the file omits falls
//! back to the defaults below, which match the deployed service. Command-line
//! flags (see [`crate::cli`]) are applied on top by `main`.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8000
//!   allowed_origins:
//!     - http://localhost:3000
//! llm:
//!   api_base: https://api.openai.com/v1
//!   explain_model: gpt-3.5-turbo
//!   summarize_model: gpt-4
//!   distractor_model: gpt-4-turbo
//!   timeout_secs: 60
//! scraper:
//!   timeout_secs: 15
//! quiz:
//!   max_attempts: 3
//! ```

use std::path::Path;
use std::time::Duration;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub scraper: ScraperConfig,
    pub quiz: QuizConfig,
}

/// HTTP listener and CORS.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://20.41.113.134".to_string(),
                "http://20.41.113.134:80".to_string(),
            ],
        }
    }
}

/// OpenAI-compatible chat-completions provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    /// Never read from the YAML file; supplied via `OPENAI_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub explain_model: String,
    pub summarize_model: String,
    pub distractor_model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            explain_model: "gpt-3.5-turbo".to_string(),
            summarize_model: "gpt-4".to_string(),
            distractor_model: "gpt-4-turbo".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Article fetching.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Quiz assembly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Upper bound on derive-and-validate attempts per quiz request.
    pub max_attempts: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            max_attempts: crate::quiz::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or defaults when `path` is `None`.
    ///
    /// The result is validated before it is returned.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => {
                info!("No config file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without validating it.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes as null; treat it as "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Check ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quiz.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "quiz.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 || self.scraper.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        for (name, model) in [
            ("llm.explain_model", &self.llm.explain_model),
            ("llm.summarize_model", &self.llm.summarize_model),
            ("llm.distractor_model", &self.llm.distractor_model),
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.llm.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.api_base must not be empty".to_string()));
        }
        for origin in &self.server.allowed_origins {
            if HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "server.allowed_origins contains an invalid origin: {origin:?}"
                )));
            }
        }
        Ok(())
    }
}
