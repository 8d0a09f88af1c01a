//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. All
//! collaborators are explicitly constructed at startup and passed in: the
//! inference client and search client hide behind traits, and the download
//! registry is a cloneable handle. Handlers and services never reach for
//! ambient singletons.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::ollama::OllamaChat;
use crate::services::chat::ChatOrchestrator;
use crate::services::downloads::DownloadRegistry;

/// Backend the pass-through proxy forwards to.
#[derive(Clone)]
pub struct ProxyTarget {
    pub backend_url: String,
    pub http: reqwest::Client,
}

impl ProxyTarget {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(backend_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { backend_url: backend_url.trim_end_matches('/').to_string(), http })
    }
}

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub ollama: Arc<dyn OllamaChat>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub downloads: DownloadRegistry,
    pub proxy: ProxyTarget,
}

impl AppState {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        ollama: Arc<dyn OllamaChat>,
        orchestrator: Arc<ChatOrchestrator>,
        proxy: ProxyTarget,
    ) -> Self {
        Self { pool, ollama, orchestrator, downloads: DownloadRegistry::new(), proxy }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
