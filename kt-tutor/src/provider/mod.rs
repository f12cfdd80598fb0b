//! LLM provider abstraction.
//!
//! The tutor only ever talks to one hosted model, but calls go through the
//! [`Provider`] trait so the resilience wrapper and tests can stand in for
//! the real backend.

mod conversation;
mod gemini;
mod resilient;

pub use conversation::{Conversation, ConversationSettings};
pub use gemini::GeminiProvider;
pub use resilient::{ResilienceConfig, ResilientProvider};

use async_trait::async_trait;
use kt_common::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for LLM providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Check if this provider supports a given model.
    fn supports_model(&self, model: &str) -> bool;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Error from a provider.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: String,
    pub model: String,
    pub message: String,
    pub status_code: Option<u16>,
}

impl ProviderError {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.model, self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for kt_common::Error {
    fn from(err: ProviderError) -> Self {
        kt_common::Error::External(kt_common::util::sanitize_for_log(&err.to_string()))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Role tag for the user side of a conversation.
pub const ROLE_USER: &str = "user";
/// Role tag for the model side of a conversation.
pub const ROLE_ASSISTANT: &str = "assistant";

/// Unified chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use
    pub model: String,
    /// Messages in the conversation, oldest first
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    /// Temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// System prompt (if not in messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_ASSISTANT.into(),
            content: content.into(),
        }
    }
}

/// Unified chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Provider name
    pub provider: String,
    /// Model used
    pub model: String,
    /// Response content
    pub content: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Response latency in milliseconds
    pub latency_ms: u64,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

/// Build the production provider stack from configuration:
/// Gemini wrapped with a per-call timeout and bounded retries.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn Provider> {
    let gemini = GeminiProvider::new(config.api_key.as_deref());

    if !gemini.supports_model(&config.model) {
        tracing::warn!(model = %config.model, "Model does not look like a Gemini model");
    }

    Arc::new(ResilientProvider::new(
        Arc::new(gemini),
        ResilienceConfig {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            base_backoff_ms: config.retry_backoff_ms,
            ..ResilienceConfig::default()
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![Message::user("Hello")],
            max_tokens: Some(1000),
            temperature: None,
            system: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("gemini-2.5-flash"));
        assert!(json.contains("Hello"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("q").role, ROLE_USER);
        assert_eq!(Message::assistant("a").role, ROLE_ASSISTANT);
    }

    #[test]
    fn test_provider_error_converts_to_external() {
        let err = ProviderError::new("gemini", "gemini-2.5-flash", "API error (503)").with_status(503);
        assert_eq!(err.to_string(), "[gemini:gemini-2.5-flash] API error (503)");

        let common: kt_common::Error = err.into();
        assert!(matches!(common, kt_common::Error::External(_)));
        assert_eq!(common.status_code(), 500);
    }

    #[test]
    fn test_create_provider_wraps_gemini() {
        let provider = create_provider(&LlmConfig::default());
        assert_eq!(provider.name(), "gemini");
        assert!(provider.supports_model("gemini-2.5-flash"));
    }
}
