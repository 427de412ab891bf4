//! LLM API interaction over the OpenAI-compatible chat-completions endpoint.
//!
//! # Architecture
//!
//! - [`ChatBackend`]: core trait for sending one chat completion and getting
//!   the assistant's text back
//! - [`OpenAiClient`]: `reqwest` implementation talking to `{api_base}/chat/completions`
//!
//! Every call is a single attempt bounded by the client timeout. Retrying is
//! the caller's decision: the quiz assembler owns its own attempt budget and
//! the chat endpoint surfaces failures directly.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::utils::truncate_for_log;

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// `response_format` of a chat-completions request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonObject,
}

/// A chat-completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl Completion {
    /// A system prompt followed by one user turn.
    pub fn new(model: impl Into<String>, system: &str, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            response_format: None,
        }
    }

    /// Ask the provider to constrain output to a JSON object.
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat::JsonObject);
        self
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl CompletionResponse {
    fn into_content(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyChoices)
    }
}

/// Trait for sending a chat completion to a model.
///
/// Implementors return the assistant message text. Futures are `Send` so the
/// backend can be driven from axum handlers.
pub trait ChatBackend: Send + Sync {
    fn complete(
        &self,
        request: Completion,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// `reqwest` client for an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiClient {
    /// Build a client with the configured request timeout.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        })
    }

    /// Whether an API key is present. Calls fail with
    /// [`LlmError::NotConfigured`] otherwise.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

impl ChatBackend for OpenAiClient {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn complete(&self, request: Completion) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::NotConfigured("OPENAI_API_KEY"))?;

        let t0 = Instant::now();
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| {
                warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "API call failed");
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis(),
                %status,
                body = %truncate_for_log(&body, 300),
                "API returned an error status"
            );
            return Err(LlmError::HttpStatus {
                status,
                body: truncate_for_log(&body, 300),
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes).inspect_err(|e| {
            warn!(
                error = %e,
                body = %truncate_for_log(&String::from_utf8_lossy(&bytes), 300),
                "Failed to decode completion envelope"
            );
        })?;
        let content = parsed.into_content()?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            bytes = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}
