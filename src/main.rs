mod db;
mod ollama;
mod routes;
mod search;
mod services;
mod state;

use std::sync::Arc;

use crate::ollama::{HttpOllamaClient, OllamaChat};
use crate::search::{GoogleSearchClient, WebSearch};
use crate::services::chat::ChatOrchestrator;
use crate::state::{AppState, ProxyTarget};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://skiff.db?mode=rwc".into());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8787".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Connection URL is sourced once at startup: env override first, stored
    // settings otherwise.
    let settings = services::settings::load(&pool)
        .await
        .expect("settings load failed");
    let api_url = std::env::var("OLLAMA_URL").unwrap_or_else(|_| settings.api_url.clone());

    let ollama: Arc<dyn OllamaChat> =
        Arc::new(HttpOllamaClient::new(&api_url).expect("ollama client build failed"));

    // Search client construction is non-fatal: without it, sends simply run
    // unaugmented and search-enabled settings fail with a configuration error.
    let search: Option<Arc<dyn WebSearch>> = match GoogleSearchClient::new() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "search client unavailable — web search disabled");
            None
        }
    };

    let orchestrator = Arc::new(ChatOrchestrator::new(ollama.clone(), search));
    let proxy = ProxyTarget::new(&api_url).expect("proxy client build failed");
    let state = AppState::new(pool, ollama, orchestrator, proxy);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, %api_url, "skiff listening");
    axum::serve(listener, app).await.expect("server failed");
}
