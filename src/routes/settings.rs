//! Settings and memory-document routes.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::services::settings;
use crate::services::store;
use crate::state::AppState;

use super::db_error_response;

/// `GET /api/settings` — the stored blob merged over defaults.
pub async fn get_settings(State(state): State<AppState>) -> Response {
    match settings::load(&state.pool).await {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `PUT /api/settings` — accept any JSON object; recognized fields override
/// defaults (with numeric coercion), the merged record is persisted and
/// returned.
pub async fn put_settings(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
    let merged = settings::merge(&body);
    match settings::save(&state.pool, &merged).await {
        Ok(()) => Json(merged).into_response(),
        Err(e) => db_error_response(&e),
    }
}

#[derive(Deserialize)]
pub struct MemoryBody {
    pub content: String,
}

/// `GET /api/memory` — the cached reference documents, if any.
pub async fn get_memory(State(state): State<AppState>) -> Response {
    match store::memory_docs(&state.pool).await {
        Ok(docs) => Json(serde_json::json!({ "content": docs })).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `PUT /api/memory` — replace the cached reference documents.
pub async fn put_memory(State(state): State<AppState>, Json(body): Json<MemoryBody>) -> Response {
    match store::set_memory_docs(&state.pool, &body.content).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => db_error_response(&e),
    }
}
