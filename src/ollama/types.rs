//! Inference endpoint types — wire shapes and errors.
//!
//! Typed request/response structs for the Ollama HTTP API. Response shapes
//! are validated here so malformed bodies surface as a parse error instead
//! of propagating missing fields downstream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by inference endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    /// The HTTP request to the inference endpoint failed in transport.
    #[error("request to inference endpoint failed: {0}")]
    Request(String),

    /// The inference endpoint returned a non-success HTTP status.
    #[error("inference endpoint returned status {status}")]
    Api { status: u16, body: String },

    /// The response body could not be deserialized into the expected shape.
    #[error("inference response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// One `{role, content}` message as sent to the chat route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl ApiMessage {
    #[must_use]
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self { role: role.to_string(), content: content.into() }
    }
}

/// Body for `POST /api/chat`. Streaming is always disabled; the orchestrator
/// consumes exactly one complete reply per send.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ApiMessage],
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    #[must_use]
    pub fn new(model: &'a str, messages: &'a [ApiMessage]) -> Self {
        Self { model, messages, stream: false }
    }
}

/// Body for `POST /api/pull`.
#[derive(Debug, Serialize)]
pub struct PullRequest<'a> {
    pub name: &'a str,
    pub stream: bool,
}

/// Response of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// One installed model as reported by the tags route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: ModelDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub parent_model: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub families: Option<Vec<String>>,
    #[serde(default)]
    pub parameter_size: String,
    #[serde(default)]
    pub quantization_level: String,
}

/// Response of `POST /api/chat` with `stream: false`.
#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub content: String,
}

// =============================================================================
// PROGRESS CALLBACK
// =============================================================================

/// Callback invoked with an integer percentage while a pull streams down.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
