//! Reasoning Backend Abstraction Layer
//!
//! This module provides a common interface for the structured-inference
//! services the planner, processor, reflector and translator delegate to
//! (Ollama, OpenAI, Anthropic). The `LLMProvider` trait is the single seam:
//! a request is an ordered list of messages, a response is the raw text the
//! model produced. The JSON contracts carried inside that text are parsed by
//! the callers through [`json`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod anthropic;
pub mod json;
pub mod ollama;
pub mod openai;
pub mod router;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// LLM Provider trait that all reasoning backends must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama", "openai", "anthropic")
    fn name(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama), false for cloud providers
    fn is_local(&self) -> bool;

    /// Generate a response from the model
    ///
    /// # Arguments
    /// * `messages` - System prompt followed by the user request
    ///
    /// # Returns
    /// * `Ok(String)` - The model's raw text output
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[Message]) -> Result<String>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Map a non-success HTTP status from a cloud backend to an `LLMError`.
///
/// The body is scrubbed before it is carried in the error since some
/// backends echo request headers.
pub(crate) fn error_for_status(status: reqwest::StatusCode, body: &str) -> LLMError {
    let body = crate::secrets::SecretManager::scrub(body);
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed(body),
        429 => LLMError::RateLimitExceeded,
        500..=599 => LLMError::ProviderUnavailable(format!("{}: {}", status, body)),
        _ => LLMError::InvalidRequest(body),
    }
}

/// Fill `{name}` placeholders of a prompt template in a single pass.
///
/// Inserted values are never rescanned, so a value that itself contains a
/// placeholder is carried verbatim. Braces that do not form a known
/// placeholder (JSON examples in the template) are kept as written.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let placeholder = values.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Shared HTTP client construction for the providers
pub(crate) fn http_client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// CLI model selector: `provider` or `provider:model`
///
/// `openai:gpt-4o-2024-11-20` selects the OpenAI provider and overrides its
/// configured model; `ollama` keeps the configured model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    pub provider: String,
    pub model: Option<String>,
}

impl FromStr for ModelSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (provider, model) = match s.split_once(':') {
            Some((provider, model)) => (provider.trim(), Some(model.trim())),
            None => (s, None),
        };

        if provider.is_empty() {
            return Err("model selector must name a provider".to_string());
        }
        let provider = provider.to_ascii_lowercase();
        if !crate::config::VALID_PROVIDERS.contains(&provider.as_str()) {
            return Err(format!(
                "unknown provider '{}'. Must be one of: {}",
                provider,
                crate::config::VALID_PROVIDERS.join(", ")
            ));
        }

        Ok(Self {
            provider,
            model: model.filter(|m| !m.is_empty()).map(str::to_string),
        })
    }
}
