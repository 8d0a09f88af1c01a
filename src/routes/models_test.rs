use super::*;
use std::sync::Arc;
use std::time::Duration;

use axum::body::to_bytes;
use axum::extract::Path;
use axum::response::Response;

use crate::ollama::types::ModelDetails;
use crate::ollama::{ApiMessage, ModelEntry, OllamaChat, OllamaError, ProgressFn};
use crate::state::test_helpers::test_app_state;

// =========================================================================
// FixedOllama
// =========================================================================

struct FixedOllama {
    models: Vec<ModelEntry>,
}

#[async_trait::async_trait]
impl OllamaChat for FixedOllama {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        Ok(self.models.clone())
    }

    async fn chat(&self, _model: &str, _messages: &[ApiMessage]) -> Result<String, OllamaError> {
        Ok("unused".to_string())
    }

    async fn pull(&self, _name: &str, on_progress: ProgressFn) -> Result<(), OllamaError> {
        on_progress(40);
        Ok(())
    }
}

fn entry(name: &str, size: u64) -> ModelEntry {
    ModelEntry {
        name: name.to_string(),
        size,
        modified_at: "2025-05-01T10:00:00Z".to_string(),
        digest: String::new(),
        details: ModelDetails::default(),
    }
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// list_models
// =========================================================================

#[tokio::test]
async fn list_models_mirrors_to_store() {
    let ollama = Arc::new(FixedOllama { models: vec![entry("llama3.2:3b", 1_900_000_000)] });
    let state = test_app_state(ollama, None).await;

    let response = list_models(State(state.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], serde_json::json!("llama3.2:3b"));
    assert_eq!(body[0]["size"], serde_json::json!("1.9 GB"));

    let mirrored = store::load_models(&state.pool).await.unwrap();
    assert_eq!(mirrored.len(), 1);
}

// =========================================================================
// pull
// =========================================================================

#[tokio::test]
async fn pull_model_accepts_and_completes() {
    let ollama = Arc::new(FixedOllama { models: Vec::new() });
    let state = test_app_state(ollama, None).await;

    let response = pull_model(
        State(state.clone()),
        Json(PullBody { name: "mistral:7b".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The pull runs in the background; wait for the registry to settle.
    let mut done = false;
    for _ in 0..50 {
        if !state.downloads.is_downloading("mistral:7b") && state.downloads.get_progress("mistral:7b") == 100 {
            done = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(done, "pull never completed");
}

#[tokio::test]
async fn pull_rejects_blank_name() {
    let ollama = Arc::new(FixedOllama { models: Vec::new() });
    let state = test_app_state(ollama, None).await;
    let response = pull_model(State(state), Json(PullBody { name: "  ".to_string() })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn progress_for_unknown_model_is_zero() {
    let ollama = Arc::new(FixedOllama { models: Vec::new() });
    let state = test_app_state(ollama, None).await;
    let response = pull_progress(State(state), Path("never-pulled".to_string())).await;
    let body = body_json(response).await;
    assert_eq!(body["progress"], serde_json::json!(0));
    assert_eq!(body["downloading"], serde_json::json!(false));
}
