//! HTTP boundary: `POST /api/chat` and `GET /health`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use crate::chat::{ChatRequest, ErrorBody, Orchestrator};
use crate::error::ChatError;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(err) => return error_response(err),
    };

    match state.orchestrator.handle_turn(request.message()).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => {
            error!(error = %err, category = ?err.category(), "Chat turn failed");
            error_response(err)
        }
    }
}

/// An empty body is a request with an empty message.
fn parse_request(body: &[u8]) -> Result<ChatRequest, ChatError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ChatRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ChatError::InvalidRequest(format!("request body is not valid JSON: {e}")))
}

fn error_response(err: ChatError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody {
        error: err.to_string(),
    };
    (status, Json(body)).into_response()
}
