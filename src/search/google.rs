//! Google Custom Search JSON API client.
//!
//! Thin HTTP wrapper over `customsearch/v1`. Pure parsing in
//! `parse_search_response` for testability. The request itself carries no
//! deadline; the orchestrator owns the (simple-mode) timeout race.

use std::time::Duration;

use serde::Deserialize;

use super::{SearchError, SearchRequest, SearchResult, WebSearch};

const API_URL: &str = "https://www.googleapis.com/customsearch/v1";
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoogleSearchClient {
    http: reqwest::Client,
}

impl GoogleSearchClient {
    /// Build the client. Credentials are supplied per request, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SearchError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl WebSearch for GoogleSearchClient {
    async fn search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchResult>, SearchError> {
        if request.api_key.is_empty() || request.engine_id.is_empty() {
            return Err(SearchError::NotConfigured);
        }

        let response = self
            .http
            .get(API_URL)
            .query(&[
                ("key", request.api_key),
                ("cx", request.engine_id),
                ("q", request.query),
                ("num", &request.max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(SearchError::Api { status, body: text });
        }

        parse_search_response(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_search_response(json: &str) -> Result<Vec<SearchResult>, SearchError> {
    let api: ApiResponse = serde_json::from_str(json).map_err(|e| SearchError::Parse(e.to_string()))?;

    if let Some(error) = api.error {
        return Err(SearchError::Provider(error.message));
    }

    Ok(api
        .items
        .into_iter()
        .map(|item| {
            let source = extract_domain(&item.link);
            SearchResult { title: item.title, link: item.link, snippet: item.snippet, source }
        })
        .collect())
}

/// Domain of a link with any leading `www.` stripped; unparsable links fall
/// back to the raw string.
pub(crate) fn extract_domain(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .map_or_else(
            || link.to_string(),
            |host| host.strip_prefix("www.").unwrap_or(&host).to_string(),
        )
}

#[cfg(test)]
#[path = "google_test.rs"]
mod tests;
