//! Web search — external augmentation for chat sends.
//!
//! DESIGN
//! ======
//! [`WebSearch`] abstracts the Google Custom Search client in [`google`] so
//! the orchestrator can be tested against mocks. Credentials arrive with
//! every request (injected from settings at call time) rather than living in
//! the client; a missing key fails fast with [`SearchError::NotConfigured`]
//! before any I/O. The pure trigger/extraction/formatting heuristics live in
//! [`intent`].

pub mod google;
pub mod intent;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use google::GoogleSearchClient;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by web search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// API key or engine id is absent from settings.
    #[error("web search is not configured")]
    NotConfigured,

    /// The HTTP request failed in transport.
    #[error("search request failed: {0}")]
    Request(String),

    /// The search API returned a non-success HTTP status.
    #[error("search API returned status {status}")]
    Api { status: u16, body: String },

    /// The provider reported an error in an otherwise well-formed body.
    #[error("search provider error: {0}")]
    Provider(String),

    /// The response body could not be deserialized.
    #[error("search response parse failed: {0}")]
    Parse(String),

    /// The search round exceeded the configured deadline.
    #[error("search timed out after {0}s")]
    Timeout(u64),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// One search hit. `source` is the link's domain with a leading `www.`
/// stripped; ephemeral, never persisted with a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub source: String,
}

/// The most recent search outcome, kept for display alongside the reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContext {
    pub query: String,
    pub results: Vec<SearchResult>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Per-call search input: the query plus credentials injected from settings.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub api_key: &'a str,
    pub engine_id: &'a str,
    pub max_results: u32,
}

// =============================================================================
// SEARCH TRAIT
// =============================================================================

/// Async search provider. Enables mocking in tests.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Run one search round.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if credentials are missing, the request
    /// fails, or the provider reports an error.
    async fn search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchResult>, SearchError>;
}
