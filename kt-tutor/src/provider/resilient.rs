//! Resilient provider wrapper with timeout and retry support.
//!
//! Every call to the inner provider is bounded by a timeout. Failed or
//! timed-out calls are retried with exponential backoff up to
//! `max_retries` times. Client errors (bad key, bad request) are not retried.

use super::{ChatRequest, ChatResponse, Provider, ProviderError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for resilient provider behavior.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Upper bound for a single call.
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds (doubles with each retry).
    pub base_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 1,
            base_backoff_ms: 500,
            max_backoff_ms: 10_000,
        }
    }
}

/// Wraps a provider with a per-call timeout and bounded retries.
pub struct ResilientProvider {
    inner: Arc<dyn Provider>,
    config: ResilienceConfig,
}

impl ResilientProvider {
    /// Create a new resilient provider.
    pub fn new(inner: Arc<dyn Provider>, config: ResilienceConfig) -> Self {
        Self { inner, config }
    }

    /// Calculate backoff delay for a given attempt.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .base_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.config.max_backoff_ms);
        Duration::from_millis(delay_ms)
    }

    /// 4xx responses other than timeout/rate-limit will fail the same way again.
    fn is_retryable(err: &ProviderError) -> bool {
        match err.status_code {
            Some(408) | Some(429) => true,
            Some(code) => !(400..500).contains(&code),
            None => true,
        }
    }

    async fn attempt(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let model = request.model.clone();
        match tokio::time::timeout(self.config.timeout, self.inner.chat(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::new(
                self.inner.name(),
                model,
                format!("Timed out after {}s", self.config.timeout.as_secs_f32()),
            )
            .with_status(408)),
        }
    }
}

#[async_trait]
impl Provider for ResilientProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports_model(&self, model: &str) -> bool {
        self.inner.supports_model(model)
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let provider_name = self.inner.name();
        let mut attempt = 0;

        loop {
            match self.attempt(request.clone()).await {
                Ok(response) => {
                    if attempt > 0 {
                        tracing::info!(
                            provider = provider_name,
                            attempt = attempt + 1,
                            "Provider recovered after retries"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if attempt < self.config.max_retries && Self::is_retryable(&e) => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        provider = provider_name,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %kt_common::util::sanitize_for_log(&e.message),
                        "Provider call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
