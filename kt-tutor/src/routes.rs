//! Route definitions for the KT tutor.
//!
//! JSON endpoints drive the tutoring workflow; the remaining routes serve
//! static pages and a health check.

use crate::pages::{Page, Pages};
use crate::tutor::Tutor;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use kt_common::logging::generate_trace_id;
use kt_common::tutor_span;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tutor: Arc<Tutor>,
    pub pages: Arc<Pages>,
}

/// `POST /start` body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub project: String,
}

/// `POST /start` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
    pub reply: String,
}

/// `POST /reply` body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub user_reply: String,
}

/// `POST /reply` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// `GET /projects` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectsResponse {
    pub projects: Vec<String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

pub const SESSION_STARTED: &str = "Teaching session started!";

/// Error wrapper rendered as `{ "error": ... }` with the mapped status.
#[derive(Debug)]
pub struct ApiError(kt_common::Error);

impl From<kt_common::Error> for ApiError {
    fn from(err: kt_common::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse { error: self.0.message() })).into_response()
    }
}

/// Build the tutoring API and page routes.
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/start", post(start_handler))
        .route("/reply", post(reply_handler))
        .route("/projects", get(projects_handler))
        .route("/", get(index_page))
        .route("/assignment", get(assignment_page))
        .route("/feedback", get(feedback_page))
        .route("/contact", get(contact_page))
        .with_state(state)
        .merge(health_routes())
}

/// Build health check routes.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tutoring Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn start_handler(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let trace_id = generate_trace_id();
    let span = tutor_span!("start", trace_id, project = %request.project.trim());

    let reply = state.tutor.start(&request.project).instrument(span).await?;

    Ok(Json(StartResponse {
        message: SESSION_STARTED.into(),
        reply,
    }))
}

async fn reply_handler(
    State(state): State<AppState>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let trace_id = generate_trace_id();
    let span = tutor_span!("reply", trace_id, project = %request.project.trim());

    let reply = state
        .tutor
        .reply(&request.project, &request.user_reply)
        .instrument(span)
        .await?;

    Ok(Json(ReplyResponse { reply }))
}

async fn projects_handler(State(state): State<AppState>) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects = state.tutor.list_projects().await?;
    Ok(Json(ProjectsResponse { projects }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

fn render(state: &AppState, page: Page) -> Result<Html<String>, ApiError> {
    state.pages.render(page).map(Html).map_err(|e| {
        kt_common::Error::Internal(e.to_string())
            .with_context(format!("rendering {} page", page.name()))
            .into()
    })
}

async fn index_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render(&state, Page::Index)
}

async fn assignment_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render(&state, Page::Assignment)
}

async fn feedback_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render(&state, Page::Feedback)
}

async fn contact_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render(&state, Page::Contact)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        service: "kt-tutor".into(),
    })
}
