//! Stateful conversation handle over a stateless provider.

use super::{ChatRequest, Message, Provider, ProviderError};
use kt_common::config::LlmConfig;
use std::sync::Arc;

/// Model parameters applied to every turn of a conversation.
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i64,
}

impl From<&LlmConfig> for ConversationSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        }
    }
}

/// An ongoing conversation with the model.
///
/// The full history is resent on every turn. A turn is only recorded once
/// the model has answered, so a failed call leaves the history untouched.
pub struct Conversation {
    provider: Arc<dyn Provider>,
    settings: ConversationSettings,
    history: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with pre-seeded history.
    pub fn new(
        provider: Arc<dyn Provider>,
        settings: ConversationSettings,
        history: Vec<Message>,
    ) -> Self {
        Self {
            provider,
            settings,
            history,
        }
    }

    /// Send a user prompt and return the model's reply text.
    pub async fn send(&mut self, prompt: impl Into<String>) -> Result<String, ProviderError> {
        let prompt = Message::user(prompt);

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.extend(self.history.iter().cloned());
        messages.push(prompt.clone());

        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
            system: None,
        };

        let response = self.provider.chat(request).await?;

        tracing::debug!(
            provider = %response.provider,
            latency_ms = response.latency_ms,
            output_tokens = response.usage.output_tokens,
            turns = self.history.len() + 2,
            "Conversation turn completed"
        );

        self.history.push(prompt);
        self.history.push(Message::assistant(response.content.clone()));
        Ok(response.content)
    }

    /// Conversation history, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .field("turns", &self.history.len())
            .finish()
    }
}
