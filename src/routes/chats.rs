//! Chat routes — conversation CRUD and the send pipeline.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::SearchContext;
use crate::services::actions::{self, AssistantAction};
use crate::services::chat::ChatError;
use crate::services::settings;
use crate::services::store::{self, Chat, ChatMessage, Role, StoreError};
use crate::state::AppState;

use super::{chat_error_status, db_error_response, error_response};

// =============================================================================
// BODIES
// =============================================================================

#[derive(Deserialize)]
pub struct CreateChatBody {
    pub model: Option<String>,
}

#[derive(Deserialize)]
pub struct SetCurrentBody {
    pub id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateChatBody {
    pub model: String,
}

#[derive(Deserialize)]
pub struct PostMessageBody {
    pub content: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<AssistantAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_context: Option<SearchContext>,
}

fn to_response(chat: Chat) -> ChatResponse {
    ChatResponse {
        id: chat.id,
        title: chat.display_title().to_string(),
        model: chat.model.clone(),
        updated_at: chat.updated_at,
        messages: chat.messages,
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// `GET /api/chats` — list chats, newest first.
pub async fn list_chats(State(state): State<AppState>) -> Response {
    match store::load_chats(&state.pool).await {
        Ok(chats) => Json(chats.into_iter().map(to_response).collect::<Vec<_>>()).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `POST /api/chats` — create a chat for the requested (or default) model.
pub async fn create_chat(State(state): State<AppState>, Json(body): Json<CreateChatBody>) -> Response {
    let model = match resolve_model(&state, body.model).await {
        Ok(model) => model,
        Err(e) => return db_error_response(&e),
    };
    match store::create_chat(&state.pool, &model).await {
        Ok(chat) => (StatusCode::CREATED, Json(to_response(chat))).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `GET /api/chats/{id}`.
pub async fn get_chat(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match store::get_chat(&state.pool, id).await {
        Ok(chat) => Json(to_response(chat)).into_response(),
        Err(StoreError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "not_found", format!("no chat {id}")),
        Err(e) => db_error_response(&e),
    }
}

/// `PATCH /api/chats/{id}` — switch the chat's model.
pub async fn update_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateChatBody>,
) -> Response {
    match store::set_chat_model(&state.pool, id, &body.model).await {
        Ok(chat) => Json(to_response(chat)).into_response(),
        Err(StoreError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "not_found", format!("no chat {id}")),
        Err(e) => db_error_response(&e),
    }
}

/// `GET /api/status` — the orchestrator's observable state.
pub async fn orchestrator_status(State(state): State<AppState>) -> Response {
    let status = state.orchestrator.status();
    Json(serde_json::json!({
        "isLoading": status.is_loading,
        "lastError": status.last_error,
        "searchContext": status.search_context,
    }))
    .into_response()
}

/// `DELETE /api/chats/{id}`.
pub async fn delete_chat(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match store::delete_chat(&state.pool, id).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `GET /api/chats/current` — the selected chat id, if any.
pub async fn get_current(State(state): State<AppState>) -> Response {
    match store::current_chat(&state.pool).await {
        Ok(id) => Json(serde_json::json!({ "id": id })).into_response(),
        Err(e) => db_error_response(&e),
    }
}

/// `PUT /api/chats/current` — select (or clear) the current chat.
pub async fn set_current(State(state): State<AppState>, Json(body): Json<SetCurrentBody>) -> Response {
    match store::set_current_chat(&state.pool, body.id).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => db_error_response(&e),
    }
}

// =============================================================================
// SEND PIPELINE
// =============================================================================

/// `POST /api/chats/{id}/messages` — append the user message, orchestrate a
/// reply, append it, and return the turn's outcome.
///
/// The user message is persisted before orchestration: a failed turn keeps
/// the question in the transcript and appends no assistant message,
/// matching the send semantics of the UI this backend serves.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PostMessageBody>,
) -> Response {
    let content = body.content.trim();
    if content.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty_message", "message content is empty");
    }

    let settings = match settings::load(&state.pool).await {
        Ok(settings) => settings,
        Err(e) => return db_error_response(&e),
    };

    let chat = match store::append_message(&state.pool, id, ChatMessage::new(Role::User, content)).await {
        Ok(chat) => chat,
        Err(StoreError::NotFound(_)) => {
            return error_response(StatusCode::NOT_FOUND, "not_found", format!("no chat {id}"));
        }
        Err(e) => return db_error_response(&e),
    };

    let model = if chat.model.is_empty() { settings.model.clone() } else { chat.model.clone() };
    if model.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no_model", "no model selected for this chat");
    }

    let memory = match store::memory_docs(&state.pool).await {
        Ok(docs) => docs,
        Err(e) => return db_error_response(&e),
    };

    let outcome = state
        .orchestrator
        .send_message(&settings, memory.as_deref(), &chat.messages, &model)
        .await;
    let reply = match outcome {
        Ok(reply) => reply,
        Err(e) => return error_response(chat_error_status(&e), "send_failed", e.to_string()),
    };

    let action = match actions::extract_action(&reply) {
        Ok(action) => action,
        Err(e) => {
            let err = ChatError::Parse(format!("action block: {e}"));
            return error_response(chat_error_status(&err), "send_failed", err.to_string());
        }
    };

    if let Err(e) = store::append_message(&state.pool, id, ChatMessage::new(Role::Assistant, reply.clone())).await {
        return db_error_response(&e);
    }

    let search_context = state.orchestrator.status().search_context;
    Json(SendResponse { reply, action, search_context }).into_response()
}

async fn resolve_model(state: &AppState, requested: Option<String>) -> Result<String, StoreError> {
    if let Some(model) = requested.filter(|m| !m.is_empty()) {
        return Ok(model);
    }
    let settings = settings::load(&state.pool).await?;
    if !settings.model.is_empty() {
        return Ok(settings.model);
    }
    let models = store::load_models(&state.pool).await?;
    Ok(models.first().map(|m| m.name.clone()).unwrap_or_default())
}

#[cfg(test)]
#[path = "chats_test.rs"]
mod tests;
