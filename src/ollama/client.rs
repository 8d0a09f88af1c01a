//! Ollama HTTP client.
//!
//! Thin wrapper over the tags/chat/pull routes. Pure parsing lives in free
//! functions for testability. The chat call carries no request timeout:
//! local models can take minutes to a first token, and no cancellation
//! policy exists at this layer.

use std::time::Duration;

use futures::StreamExt;

use super::types::{
    ApiMessage, ChatCompletion, ChatRequest, ModelEntry, OllamaError, ProgressFn, PullRequest, TagsResponse,
};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Divisor turning cumulative pull bytes into a rough percentage. Inherited
/// approximation: the pull stream reports no total, so bytes-over-constant is
/// the only progress proxy available.
const PULL_PROGRESS_DIVISOR: u64 = 10_000_000;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpOllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOllamaClient {
    /// Build a client against the given base URL (e.g. `http://localhost:11434`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, OllamaError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| OllamaError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub(crate) async fn list_models_inner(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        let url = format!("{}/api/tags", self.base_url);
        let text = self.get_text(&url).await?;
        parse_tags_response(&text)
    }

    pub(crate) async fn chat_inner(&self, model: &str, messages: &[ApiMessage]) -> Result<String, OllamaError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest::new(model, messages);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(OllamaError::Api { status, body: text });
        }

        parse_chat_response(&text)
    }

    pub(crate) async fn pull_inner(&self, name: &str, on_progress: ProgressFn) -> Result<(), OllamaError> {
        let url = format!("{}/api/pull", self.base_url);
        let body = PullRequest { name, stream: true };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api { status, body: text });
        }

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| OllamaError::Request(e.to_string()))?;
            received += chunk.len() as u64;
            on_progress(progress_for_bytes(received));
        }

        Ok(())
    }

    async fn get_text(&self, url: &str) -> Result<String, OllamaError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(OllamaError::Api { status, body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_tags_response(json: &str) -> Result<Vec<ModelEntry>, OllamaError> {
    let tags: TagsResponse = serde_json::from_str(json).map_err(|e| OllamaError::Parse(e.to_string()))?;
    Ok(tags.models)
}

pub(crate) fn parse_chat_response(json: &str) -> Result<String, OllamaError> {
    let completion: ChatCompletion = serde_json::from_str(json).map_err(|e| OllamaError::Parse(e.to_string()))?;
    let message = completion
        .message
        .ok_or_else(|| OllamaError::Parse("chat response missing message".to_string()))?;
    Ok(message.content)
}

/// Rounded `received / divisor`, capped at 100.
pub(crate) fn progress_for_bytes(received: u64) -> u8 {
    let percent = received.saturating_add(PULL_PROGRESS_DIVISOR / 2) / PULL_PROGRESS_DIVISOR;
    u8::try_from(percent.min(100)).unwrap_or(100)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
