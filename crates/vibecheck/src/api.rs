//! 🚪 The HTTP front door. Thin on purpose.
//!
//! Two ways in, both ending up as the same job:
//! - `GET /{video_id}`: the ID is a path segment
//! - `POST /`: the ID is the raw request body
//!
//! The handler submits the job, waits for its outcome, and relays it as JSON.
//! `GET /health` reports liveness and the queue depth. CORS is wide open because
//! the browser extension calls us from whatever page the user is on.

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::{AnalysisError, Outcome};
use crate::queue::JobQueue;

/// 📦 Shared handler state. Just the producer end of the queue.
#[derive(Debug, Clone)]
pub struct AppState {
    pub queue: JobQueue,
}

impl AppState {
    pub fn new(queue: JobQueue) -> Self {
        Self { queue }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub queued_jobs: usize,
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(kind) => kind.into_response(),
    }
}

/// GET /{video_id}
async fn analyze_path(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    debug!("📨 GET analysis request for '{}'", video_id);
    outcome_response(state.queue.submit(video_id).await)
}

/// POST / with the video ID as the whole body.
///
/// Takes raw bytes so a body that isn't UTF-8 still gets a JSON error, not axum's plain-text one.
async fn analyze_body(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(text) = std::str::from_utf8(&body) else {
        return bad_request("Request body must be a UTF-8 video id");
    };
    let video_id = text.trim();
    if video_id.is_empty() {
        return bad_request("Request body must contain a video id");
    }
    debug!("📨 POST analysis request for '{}'", video_id);
    outcome_response(state.queue.submit(video_id).await)
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        queued_jobs: state.queue.len(),
    })
}

/// 🏗️ Wire up the routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", post(analyze_body))
        .route("/:video_id", get(analyze_path))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
