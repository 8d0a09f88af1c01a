use super::*;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use axum::body::to_bytes;

use crate::ollama::{ApiMessage, ModelEntry, OllamaChat, OllamaError, ProgressFn};
use crate::state::test_helpers::test_app_state;

// =========================================================================
// ScriptedOllama
// =========================================================================

struct ScriptedOllama {
    replies: StdMutex<Vec<Result<String, OllamaError>>>,
}

impl ScriptedOllama {
    fn new(replies: Vec<Result<String, OllamaError>>) -> Arc<Self> {
        Arc::new(Self { replies: StdMutex::new(replies) })
    }
}

#[async_trait::async_trait]
impl OllamaChat for ScriptedOllama {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        Ok(Vec::new())
    }

    async fn chat(&self, _model: &str, _messages: &[ApiMessage]) -> Result<String, OllamaError> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok("done".to_string())
        } else {
            replies.remove(0)
        }
    }

    async fn pull(&self, _name: &str, _on_progress: ProgressFn) -> Result<(), OllamaError> {
        Ok(())
    }
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// send pipeline
// =========================================================================

#[tokio::test]
async fn post_message_appends_both_turns() {
    let state = test_app_state(ScriptedOllama::new(vec![Ok("hi there".to_string())]), None).await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();

    let response = post_message(
        State(state.clone()),
        Path(chat.id),
        Json(PostMessageBody { content: "hello".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reply"], serde_json::json!("hi there"));

    let stored = store::get_chat(&state.pool, chat.id).await.unwrap();
    assert_eq!(stored.messages.len(), 2);
    assert_eq!(stored.messages[0].role, Role::User);
    assert_eq!(stored.messages[1].role, Role::Assistant);
    assert_eq!(stored.messages[1].content, "hi there");
    assert_eq!(stored.title, "hello");
}

#[tokio::test]
async fn failed_send_keeps_user_message_only() {
    let state = test_app_state(
        ScriptedOllama::new(vec![Err(OllamaError::Request("refused".to_string()))]),
        None,
    )
    .await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();

    let response = post_message(
        State(state.clone()),
        Path(chat.id),
        Json(PostMessageBody { content: "hello".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], serde_json::json!("send_failed"));

    let stored = store::get_chat(&state.pool, chat.id).await.unwrap();
    assert_eq!(stored.messages.len(), 1);
    assert_eq!(stored.messages[0].role, Role::User);
}

#[tokio::test]
async fn post_message_surfaces_action_block() {
    let reply = "Removed it.\n```json\n{\"action\":\"delete\",\"target\":\"products\"}\n```";
    let state = test_app_state(ScriptedOllama::new(vec![Ok(reply.to_string())]), None).await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();

    let response = post_message(
        State(state.clone()),
        Path(chat.id),
        Json(PostMessageBody { content: "delete the auger".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["action"]["action"], serde_json::json!("delete"));
}

#[tokio::test]
async fn malformed_action_block_is_unprocessable() {
    let reply = "Done.\n```json\nnot json\n```";
    let state = test_app_state(ScriptedOllama::new(vec![Ok(reply.to_string())]), None).await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();

    let response = post_message(
        State(state.clone()),
        Path(chat.id),
        Json(PostMessageBody { content: "do it".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The failed turn appended no assistant message.
    let stored = store::get_chat(&state.pool, chat.id).await.unwrap();
    assert_eq!(stored.messages.len(), 1);
}

#[tokio::test]
async fn unknown_chat_is_not_found() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let response = post_message(
        State(state),
        Path(Uuid::new_v4()),
        Json(PostMessageBody { content: "hello".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();
    let response = post_message(
        State(state),
        Path(chat.id),
        Json(PostMessageBody { content: "   ".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_model_everywhere_is_rejected() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let chat = store::create_chat(&state.pool, "").await.unwrap();
    let response = post_message(
        State(state),
        Path(chat.id),
        Json(PostMessageBody { content: "hello".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =========================================================================
// crud handlers
// =========================================================================

#[tokio::test]
async fn create_then_list_round_trips() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let response = create_chat(
        State(state.clone()),
        Json(CreateChatBody { model: Some("demo".to_string()) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["title"], serde_json::json!("New Chat"));
    assert_eq!(created["model"], serde_json::json!("demo"));

    let listed = body_json(list_chats(State(state)).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_unknown_chat_is_not_found() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let response = get_chat(State(state), Path(Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_chat_switches_model() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let chat = store::create_chat(&state.pool, "llama3.2:3b").await.unwrap();

    let response = update_chat(
        State(state.clone()),
        Path(chat.id),
        Json(UpdateChatBody { model: "mistral:7b".to_string() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = store::get_chat(&state.pool, chat.id).await.unwrap();
    assert_eq!(stored.model, "mistral:7b");
}

#[tokio::test]
async fn status_reports_last_error() {
    let state = test_app_state(
        ScriptedOllama::new(vec![Err(OllamaError::Request("refused".to_string()))]),
        None,
    )
    .await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();
    post_message(
        State(state.clone()),
        Path(chat.id),
        Json(PostMessageBody { content: "hello".to_string() }),
    )
    .await;

    let body = body_json(orchestrator_status(State(state)).await).await;
    assert_eq!(body["isLoading"], serde_json::json!(false));
    assert!(body["lastError"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn current_chat_tracks_selection() {
    let state = test_app_state(ScriptedOllama::new(Vec::new()), None).await;
    let chat = store::create_chat(&state.pool, "demo").await.unwrap();

    let body = body_json(get_current(State(state.clone())).await).await;
    assert_eq!(body["id"], serde_json::json!(chat.id));

    set_current(State(state.clone()), Json(SetCurrentBody { id: None })).await;
    let body = body_json(get_current(State(state)).await).await;
    assert_eq!(body["id"], serde_json::Value::Null);
}
