//! KT Tutor - walks new employees through a project's Knowledge Transfer
//! document, one section at a time, with an LLM explaining each section.
//!
//! ## Architecture
//!
//! ```text
//! HTTP → Tutor ─ DocumentLoader → chunker → SessionRepository
//!          │
//!          └─ Conversation → ResilientProvider → Gemini
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod chunker;
pub mod documents;
pub mod intent;
pub mod pages;
pub mod provider;
pub mod routes;
pub mod session;
pub mod tutor;

pub use documents::DocumentLoader;
pub use intent::{Intent, IntentClassifier, KeywordClassifier};
pub use provider::{
    ChatRequest, ChatResponse, Conversation, ConversationSettings, GeminiProvider, Message,
    Provider, ProviderError, ResilienceConfig, ResilientProvider, TokenUsage,
};
pub use routes::AppState;
pub use session::{InMemorySessionRepository, Session, SessionRepository};
pub use tutor::Tutor;

use axum::http::StatusCode;
use axum::Router;
use kt_common::config::Config;
use pages::Pages;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

impl AppState {
    /// Assemble the state around an existing tutor.
    pub fn new(tutor: Tutor) -> anyhow::Result<Self> {
        Ok(Self {
            tutor: Arc::new(tutor),
            pages: Arc::new(Pages::new()?),
        })
    }

    /// Build the production state: Gemini provider and configured documents directory.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider::create_provider(&config.llm);
        Self::new(Tutor::from_config(config, provider))
    }
}

/// Build the tutor router with all routes and middleware.
///
/// The request timeout sits above the provider's own retry budget so a slow
/// model call is cut by the provider, not mid-response.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::build_routes(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Overall per-request deadline derived from the LLM settings.
pub fn request_timeout(config: &Config) -> Duration {
    let llm = &config.llm;
    let attempts = u64::from(llm.max_retries) + 1;
    Duration::from_secs(llm.timeout_secs * attempts)
        + Duration::from_millis(llm.retry_backoff_ms * attempts)
        + Duration::from_secs(5)
}

/// Start the tutor server.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    state.tutor.loader().ensure_dir()?;

    if !config.has_api_key() {
        tracing::warn!("No Gemini API key configured; explanations will fall back to apology messages");
    }

    let router = build_router(state, request_timeout(config));
    let addr = config.listen_address();

    tracing::info!(
        address = %addr,
        documents = %config.documents.dir.display(),
        model = %config.llm.model,
        "Starting KT Tutor"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
