//! HTTP request handlers

use super::types::{ErrorResponse, EventResponse, HealthResponse, MessageResponse};
use super::AppState;
use crate::state_machine::{MessageId, Notification};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Lifecycle notifications from the host
        .route("/api/events", post(post_event))
        // Per-message state
        .route("/api/messages/:message_id", get(get_message))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn post_event(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> Result<Json<EventResponse>, AppError> {
    // Detached so a dropped connection cannot cancel a completion attempt
    let controller = Arc::clone(&state.controller);
    let handled = tokio::spawn(async move { controller.handle(notification).await })
        .await
        .map_err(|e| AppError::Internal(format!("Event handler failed: {e}")))?;
    Ok(Json(handled.into()))
}

async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let message_id = MessageId::from(message_id);
    state
        .controller
        .store()
        .get(&message_id)
        .map(|tracked| Json(tracked.into()))
        .ok_or_else(|| AppError::NotFound(format!("Message {message_id} is not tracked")))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        tracked: state.controller.store().len(),
        gateway: state.controller.has_gateway(),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
