//! Settings — persisted user configuration with defaults.
//!
//! DESIGN
//! ======
//! The stored blob is merged over defaults field by field: stored values
//! override defaults, never the reverse, and numeric fields coerce from JSON
//! numbers or numeric strings. A missing or malformed blob reads as pure
//! defaults. Callers load once per operation and inject the value into the
//! orchestrator; nothing reads ambient storage mid-call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::db;

pub const DEFAULT_API_URL: &str = "http://localhost:11434";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// =============================================================================
// TYPES
// =============================================================================

/// How the orchestrator decides whether a send needs web search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Trigger-phrase scan over the last message.
    #[default]
    Simple,
    /// A decision sub-call to the inference endpoint.
    Advanced,
}

/// Flat configuration record. Persisted as one JSON blob under a fixed key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub api_url: String,
    pub model: String,
    pub system_prompt: String,

    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub repeat_penalty: f64,

    pub enable_memory: bool,
    pub enable_web_search: bool,
    pub search_mode: SearchMode,
    pub google_api_key: String,
    pub google_search_engine_id: String,
    pub max_search_results: u32,
    pub search_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            model: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            repeat_penalty: 1.1,
            enable_memory: false,
            enable_web_search: false,
            search_mode: SearchMode::Simple,
            google_api_key: String::new(),
            google_search_engine_id: String::new(),
            max_search_results: 3,
            search_timeout_secs: 10,
        }
    }
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

/// Load settings: the stored blob merged over defaults.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub async fn load(pool: &SqlitePool) -> Result<Settings, sqlx::Error> {
    let stored = db::kv_get(pool, db::KEY_SETTINGS).await?;
    Ok(stored.map_or_else(Settings::default, |value| merge(&value)))
}

/// Persist the full settings record.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub async fn save(pool: &SqlitePool, settings: &Settings) -> Result<(), sqlx::Error> {
    let value = serde_json::to_value(settings).unwrap_or(Value::Null);
    db::kv_put(pool, db::KEY_SETTINGS, &value).await
}

// =============================================================================
// MERGE
// =============================================================================

/// Merge a stored JSON blob over defaults. Unknown keys are ignored; fields
/// of the wrong shape fall back to their default.
#[must_use]
pub fn merge(stored: &Value) -> Settings {
    let mut settings = Settings::default();
    let Some(map) = stored.as_object() else {
        return settings;
    };

    set_string(map, "theme", &mut settings.theme);
    set_string(map, "apiUrl", &mut settings.api_url);
    set_string(map, "model", &mut settings.model);
    set_string(map, "systemPrompt", &mut settings.system_prompt);

    set_u32(map, "maxTokens", &mut settings.max_tokens);
    set_f64(map, "temperature", &mut settings.temperature);
    set_f64(map, "topP", &mut settings.top_p);
    set_u32(map, "topK", &mut settings.top_k);
    set_f64(map, "repeatPenalty", &mut settings.repeat_penalty);

    set_bool(map, "enableMemory", &mut settings.enable_memory);
    set_bool(map, "enableWebSearch", &mut settings.enable_web_search);
    if let Some(mode) = map.get("searchMode").and_then(Value::as_str) {
        match mode {
            "advanced" => settings.search_mode = SearchMode::Advanced,
            _ => settings.search_mode = SearchMode::Simple,
        }
    }
    set_string(map, "googleApiKey", &mut settings.google_api_key);
    set_string(map, "googleSearchEngineId", &mut settings.google_search_engine_id);
    set_u32(map, "maxSearchResults", &mut settings.max_search_results);
    set_u64(map, "searchTimeoutSecs", &mut settings.search_timeout_secs);

    settings
}

type Map = serde_json::Map<String, Value>;

fn set_string(map: &Map, key: &str, slot: &mut String) {
    if let Some(v) = map.get(key).and_then(Value::as_str) {
        *slot = v.to_string();
    }
}

fn set_bool(map: &Map, key: &str, slot: &mut bool) {
    if let Some(v) = map.get(key).and_then(Value::as_bool) {
        *slot = v;
    }
}

fn set_u32(map: &Map, key: &str, slot: &mut u32) {
    if let Some(v) = map.get(key).and_then(coerce_u64) {
        if let Ok(v) = u32::try_from(v) {
            *slot = v;
        }
    }
}

fn set_u64(map: &Map, key: &str, slot: &mut u64) {
    if let Some(v) = map.get(key).and_then(coerce_u64) {
        *slot = v;
    }
}

fn set_f64(map: &Map, key: &str, slot: &mut f64) {
    if let Some(v) = map.get(key).and_then(coerce_f64) {
        *slot = v;
    }
}

/// Numeric coercion: a JSON number, or a string holding one.
fn coerce_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn coerce_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
