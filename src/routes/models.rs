//! Model routes — installed-model listing and pull progress.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::ollama::OllamaChat as _;
use crate::services::store;
use crate::state::AppState;

use super::{db_error_response, error_response};

#[derive(Deserialize)]
pub struct PullBody {
    pub name: String,
}

/// `GET /api/models` — enumerate installed models and mirror the list.
pub async fn list_models(State(state): State<AppState>) -> Response {
    let entries = match state.ollama.list_models().await {
        Ok(entries) => entries,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, "inference", e.to_string()),
    };
    match store::save_models(&state.pool, &entries).await {
        Ok(models) => Json(models).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `POST /api/models/pull` — start pulling a model; progress is polled via
/// the registry. Responds immediately, the pull continues in the background.
pub async fn pull_model(State(state): State<AppState>, Json(body): Json<PullBody>) -> Response {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no_model", "model name is empty");
    }

    let registry = state.downloads.clone();
    let ollama = state.ollama.clone();
    let pool = state.pool.clone();
    let task_name = name.clone();
    tokio::spawn(async move {
        // Server-side observer on the same subscription surface clients use.
        let log_name = task_name.clone();
        let observer = registry.subscribe_progress(
            &task_name,
            Arc::new(move |progress| debug!(model = %log_name, progress, "pull progress")),
        );
        let pulled = registry
            .start_download(&task_name, |report| {
                let ollama = ollama.clone();
                let name = task_name.clone();
                async move { ollama.pull(&name, report).await }
            })
            .await;
        observer.unsubscribe();
        match pulled {
            Ok(()) => {
                info!(model = %task_name, "pull complete");
                // Refresh the installed-model mirror now that the pull landed.
                if let Ok(entries) = ollama.list_models().await {
                    if let Err(e) = store::save_models(&pool, &entries).await {
                        error!(error = %e, "failed to mirror models after pull");
                    }
                }
            }
            Err(e) => error!(model = %task_name, error = %e, "pull failed"),
        }
    });

    let progress = state.downloads.get_progress(&name);
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "name": name, "progress": progress })),
    )
        .into_response()
}

/// `GET /api/models/{name}/progress`.
pub async fn pull_progress(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    Json(serde_json::json!({
        "name": name,
        "progress": state.downloads.get_progress(&name),
        "downloading": state.downloads.is_downloading(&name),
    }))
    .into_response()
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
