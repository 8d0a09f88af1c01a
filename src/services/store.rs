//! Chat store — conversations persisted through the kv layer.
//!
//! DESIGN
//! ======
//! Chats live as one JSON list under a fixed key. Every mutation is
//! load → mutate → save, written eagerly, so the persisted copy and the live
//! copy are the same source of truth. A malformed stored list reads as empty
//! rather than failing the operation, matching the forgiving read policy of
//! the rest of the kv layer.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::ollama::ModelEntry;

/// Maximum derived-title length before truncation.
const TITLE_MAX_CHARS: usize = 30;

// =============================================================================
// TYPES
// =============================================================================

/// Message author role. Determines rendering and whether a message counts
/// toward "is this a new conversation".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A single conversation message. Immutable once created; content changes
/// replace the message wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, content: content.into(), timestamp: OffsetDateTime::now_utc() }
    }
}

/// A persisted, titled, ordered conversation. Owns its messages exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub model: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Chat {
    /// New untitled chat; the title is derived from the first user message.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            messages: Vec::new(),
            model: model.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Title for display; untitled chats show as "New Chat".
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { "New Chat" } else { &self.title }
    }
}

/// Installed-model summary mirrored to the kv store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: String,
    pub modified_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("chat not found: {0}")]
    NotFound(Uuid),
}

// =============================================================================
// CHAT LIST
// =============================================================================

/// Load all chats, newest first.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub async fn load_chats(pool: &SqlitePool) -> Result<Vec<Chat>, StoreError> {
    let Some(value) = db::kv_get(pool, db::KEY_CHATS).await? else {
        return Ok(Vec::new());
    };
    match serde_json::from_value(value) {
        Ok(chats) => Ok(chats),
        Err(e) => {
            warn!(error = %e, "stored chat list is malformed — starting empty");
            Ok(Vec::new())
        }
    }
}

async fn save_chats(pool: &SqlitePool, chats: &[Chat]) -> Result<(), StoreError> {
    let value = serde_json::to_value(chats).unwrap_or(serde_json::Value::Null);
    db::kv_put(pool, db::KEY_CHATS, &value).await?;
    Ok(())
}

/// Create a new chat at the head of the list and select it.
///
/// # Errors
///
/// Returns an error if persistence fails.
pub async fn create_chat(pool: &SqlitePool, model: &str) -> Result<Chat, StoreError> {
    let chat = Chat::new(model);
    let mut chats = load_chats(pool).await?;
    chats.insert(0, chat.clone());
    save_chats(pool, &chats).await?;
    set_current_chat(pool, Some(chat.id)).await?;
    Ok(chat)
}

/// Fetch one chat by id.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for unknown ids.
pub async fn get_chat(pool: &SqlitePool, id: Uuid) -> Result<Chat, StoreError> {
    let chats = load_chats(pool).await?;
    chats
        .into_iter()
        .find(|chat| chat.id == id)
        .ok_or(StoreError::NotFound(id))
}

/// Delete a chat; clears the current-chat selection if it pointed there.
///
/// # Errors
///
/// Returns an error if persistence fails.
pub async fn delete_chat(pool: &SqlitePool, id: Uuid) -> Result<(), StoreError> {
    let mut chats = load_chats(pool).await?;
    chats.retain(|chat| chat.id != id);
    save_chats(pool, &chats).await?;

    if current_chat(pool).await? == Some(id) {
        set_current_chat(pool, chats.first().map(|chat| chat.id)).await?;
    }
    Ok(())
}

/// Append a message to a chat, deriving the title from the first user
/// message of an untitled chat and bumping `updated_at`.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for unknown ids, or a database error.
pub async fn append_message(pool: &SqlitePool, id: Uuid, message: ChatMessage) -> Result<Chat, StoreError> {
    let mut chats = load_chats(pool).await?;
    let chat = chats
        .iter_mut()
        .find(|chat| chat.id == id)
        .ok_or(StoreError::NotFound(id))?;

    if chat.title.is_empty() && chat.messages.is_empty() && message.role == Role::User {
        chat.title = derive_title(&message.content);
    }
    chat.messages.push(message);
    chat.updated_at = OffsetDateTime::now_utc();

    let updated = chat.clone();
    save_chats(pool, &chats).await?;
    Ok(updated)
}

/// Replace a chat's model.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for unknown ids, or a database error.
pub async fn set_chat_model(pool: &SqlitePool, id: Uuid, model: &str) -> Result<Chat, StoreError> {
    let mut chats = load_chats(pool).await?;
    let chat = chats
        .iter_mut()
        .find(|chat| chat.id == id)
        .ok_or(StoreError::NotFound(id))?;
    chat.model = model.to_string();
    chat.updated_at = OffsetDateTime::now_utc();

    let updated = chat.clone();
    save_chats(pool, &chats).await?;
    Ok(updated)
}

// =============================================================================
// CURRENT CHAT
// =============================================================================

/// The currently selected chat id, if any.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub async fn current_chat(pool: &SqlitePool) -> Result<Option<Uuid>, StoreError> {
    let value = db::kv_get(pool, db::KEY_CURRENT_CHAT).await?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Select (or clear) the current chat.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub async fn set_current_chat(pool: &SqlitePool, id: Option<Uuid>) -> Result<(), StoreError> {
    match id {
        Some(id) => db::kv_put(pool, db::KEY_CURRENT_CHAT, &serde_json::json!(id)).await?,
        None => db::kv_delete(pool, db::KEY_CURRENT_CHAT).await?,
    }
    Ok(())
}

// =============================================================================
// MODEL MIRROR
// =============================================================================

/// Mirror the installed-model list from a tags response.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub async fn save_models(pool: &SqlitePool, entries: &[ModelEntry]) -> Result<Vec<ModelInfo>, StoreError> {
    let models: Vec<ModelInfo> = entries
        .iter()
        .map(|entry| ModelInfo {
            name: entry.name.clone(),
            size: human_size(entry.size),
            modified_at: entry.modified_at.clone(),
        })
        .collect();
    let value = serde_json::to_value(&models).unwrap_or(serde_json::Value::Null);
    db::kv_put(pool, db::KEY_MODELS, &value).await?;
    Ok(models)
}

/// Last mirrored installed-model list.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub async fn load_models(pool: &SqlitePool) -> Result<Vec<ModelInfo>, StoreError> {
    let Some(value) = db::kv_get(pool, db::KEY_MODELS).await? else {
        return Ok(Vec::new());
    };
    Ok(serde_json::from_value(value).unwrap_or_default())
}

// =============================================================================
// MEMORY DOCUMENTS
// =============================================================================

/// Cached reference documents injected as system context when memory is on.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub async fn memory_docs(pool: &SqlitePool) -> Result<Option<String>, StoreError> {
    let value = db::kv_get(pool, db::KEY_MEMORY_DOCS).await?;
    Ok(value.and_then(|v| v.as_str().map(str::to_owned)))
}

/// Replace the cached reference documents.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub async fn set_memory_docs(pool: &SqlitePool, docs: &str) -> Result<(), StoreError> {
    db::kv_put(pool, db::KEY_MEMORY_DOCS, &serde_json::json!(docs)).await?;
    Ok(())
}

/// Human-readable byte size in the runtime's own "1.9 GB" style.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    const GB: u64 = 1_000_000_000;
    const MB: u64 = 1_000_000;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.0} MB", bytes as f64 / MB as f64)
    } else {
        format!("{bytes} B")
    }
}

// =============================================================================
// TITLE DERIVATION
// =============================================================================

/// First 30 characters of the trimmed text, with an ellipsis marker when
/// truncated.
#[must_use]
pub fn derive_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
