//! Ollama — typed client for the local inference runtime.
//!
//! DESIGN
//! ======
//! The HTTP surface (`GET /api/tags`, `POST /api/chat`, `POST /api/pull`)
//! hides behind the [`OllamaChat`] trait so the orchestrator and routes can
//! be exercised against mocks. The real client lives in [`client`]; wire
//! shapes and errors in [`types`].

pub mod client;
pub mod types;

pub use client::HttpOllamaClient;
pub use types::{ApiMessage, ModelEntry, OllamaError, ProgressFn};

// =============================================================================
// CHAT TRAIT
// =============================================================================

/// Provider-neutral async trait for the inference runtime. Enables mocking
/// in tests.
#[async_trait::async_trait]
pub trait OllamaChat: Send + Sync {
    /// Enumerate installed models.
    ///
    /// # Errors
    ///
    /// Returns an [`OllamaError`] if the request fails or the response is
    /// malformed.
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError>;

    /// Send a conversation and return the assistant's reply content.
    ///
    /// # Errors
    ///
    /// Returns an [`OllamaError`] if the endpoint is unreachable, returns a
    /// non-success status, or produces a malformed body.
    async fn chat(&self, model: &str, messages: &[ApiMessage]) -> Result<String, OllamaError>;

    /// Pull a model by name, reporting rough percentage progress as the
    /// response body streams down.
    ///
    /// # Errors
    ///
    /// Returns an [`OllamaError`] if the request fails or the stream breaks.
    async fn pull(&self, name: &str, on_progress: ProgressFn) -> Result<(), OllamaError>;
}

#[async_trait::async_trait]
impl OllamaChat for HttpOllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        self.list_models_inner().await
    }

    async fn chat(&self, model: &str, messages: &[ApiMessage]) -> Result<String, OllamaError> {
        self.chat_inner(model, messages).await
    }

    async fn pull(&self, name: &str, on_progress: ProgressFn) -> Result<(), OllamaError> {
        self.pull_inner(name, on_progress).await
    }
}
