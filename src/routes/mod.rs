//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the REST surface (chats, models, settings) and the pass-through
//! proxy under a single Axum router. Errors leave every handler as a JSON
//! envelope `{error, message}` so clients render one shape everywhere.

pub mod chats;
pub mod models;
pub mod proxy;
pub mod settings;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::chat::ChatError;
use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/status", get(chats::orchestrator_status))
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route("/api/chats/current", get(chats::get_current).put(chats::set_current))
        .route(
            "/api/chats/{id}",
            get(chats::get_chat).patch(chats::update_chat).delete(chats::delete_chat),
        )
        .route("/api/chats/{id}/messages", post(chats::post_message))
        .route("/api/models", get(models::list_models))
        .route("/api/models/pull", post(models::pull_model))
        .route("/api/models/{name}/progress", get(models::pull_progress))
        .route("/api/settings", get(settings::get_settings).put(settings::put_settings))
        .route("/api/memory", get(settings::get_memory).put(settings::put_memory))
        .route("/proxy/{*path}", any(proxy::forward))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERROR ENVELOPE
// =============================================================================

/// Uniform JSON error body: `{"error": <code>, "message": <human readable>}`.
pub(crate) fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let body = Json(serde_json::json!({ "error": error, "message": message.into() }));
    (status, body).into_response()
}

pub(crate) fn chat_error_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::EmptyInput => StatusCode::BAD_REQUEST,
        ChatError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::Inference(_) | ChatError::Search(_) => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn db_error_response(err: &dyn std::error::Error) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage", err.to_string())
}
