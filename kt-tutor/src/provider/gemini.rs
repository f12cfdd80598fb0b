//! Google Gemini provider.
//!
//! Talks to the `generateContent` REST endpoint with an API key sent in the
//! `x-goog-api-key` header.

use super::{ChatRequest, ChatResponse, Provider, ProviderError, TokenUsage, ROLE_ASSISTANT};
use async_trait::async_trait;
use kt_common::util::truncate_with_ellipsis;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Gemini provider.
pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

// ══════════════════════════════════════════════════════════════════════════════
// API REQUEST/RESPONSE TYPES
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<i64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<i64>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<i64>,
}

impl GeminiProvider {
    /// Create a new Gemini provider. A missing key is reported per call,
    /// not at construction, so the service can still start without one.
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(String::from),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Point the provider at a different endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        let model_name = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!("{}/{model_name}:generateContent", self.base_url)
    }

    fn build_body(request: &ChatRequest) -> GenerateContentRequest {
        let system_instruction = request.system.as_ref().map(|sys| Content {
            role: None,
            parts: vec![Part { text: sys.clone() }],
        });

        let contents = request
            .messages
            .iter()
            .map(|msg| Content {
                role: Some(if msg.role == ROLE_ASSISTANT {
                    "model".to_string()
                } else {
                    msg.role.clone()
                }),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(0.7),
                max_output_tokens: request.max_tokens.unwrap_or(8192),
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn supports_model(&self, model: &str) -> bool {
        model.starts_with("gemini-") || model.starts_with("models/gemini-")
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let start = Instant::now();
        let fail = |message: String| ProviderError::new("gemini", request.model.clone(), message);

        let api_key = self.api_key.as_ref().ok_or_else(|| {
            fail("Gemini API key not found. Set GEMINI_API_KEY or llm.api_key.".into())
                .with_status(401)
        })?;

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&Self::build_body(&request))
            .send()
            .await
            .map_err(|e| fail(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = format!(
                "API error ({}): {}",
                status.as_u16(),
                truncate_with_ellipsis(&error_text, MAX_ERROR_BODY_CHARS)
            );
            return Err(fail(message).with_status(status.as_u16()));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| fail(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = result.error {
            return Err(fail(format!("API error: {}", err.message)));
        }

        let candidate = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| fail("No response from Gemini".into()))?;

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(fail(format!(
                "Empty response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let usage = result.usage_metadata.map_or(TokenUsage::default(), |u| TokenUsage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count.unwrap_or(0),
        });

        Ok(ChatResponse {
            provider: "gemini".into(),
            model: request.model,
            content,
            usage,
            finish_reason: candidate.finish_reason,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Message;

    #[test]
    fn provider_creates_with_key() {
        let provider = GeminiProvider::new(Some("test-api-key"));
        assert!(provider.has_api_key());
        assert_eq!(provider.api_key.as_deref(), Some("test-api-key"));
    }

    #[test]
    fn empty_key_counts_as_missing() {
        assert!(!GeminiProvider::new(Some("")).has_api_key());
        assert!(!GeminiProvider::new(None).has_api_key());
    }

    #[test]
    fn supports_gemini_models() {
        let provider = GeminiProvider::new(Some("key"));
        assert!(provider.supports_model("gemini-2.5-flash"));
        assert!(provider.supports_model("models/gemini-1.5-pro"));
        assert!(!provider.supports_model("gpt-4"));
    }

    #[test]
    fn endpoint_prefixes_models() {
        let provider = GeminiProvider::new(Some("key")).with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            provider.endpoint("gemini-2.5-flash"),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            provider.endpoint("models/gemini-2.5-flash"),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn body_maps_assistant_to_model_role() {
        let request = ChatRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![Message::user("seed"), Message::assistant("ack")],
            max_tokens: None,
            temperature: Some(0.2),
            system: None,
        };

        let body = serde_json::to_value(GeminiProvider::build_body(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "ack");
        assert_eq!(body["generationConfig"]["temperature"], 0.2);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert!(body.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = GeminiProvider::new(None);
        let err = provider
            .chat(ChatRequest {
                model: "gemini-2.5-flash".into(),
                messages: vec![Message::user("hi")],
                max_tokens: None,
                temperature: None,
                system: None,
            })
            .await
            .unwrap_err();
        assert!(err.message.contains("API key not found"));
        assert_eq!(err.provider, "gemini");
    }
}
