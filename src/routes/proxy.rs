//! Pass-through proxy to the inference backend.
//!
//! DESIGN
//! ======
//! Strips the `/proxy` prefix, forwards method, body, and content type to
//! the configured backend URL, and returns the backend's status and body
//! verbatim. Transport failures become a 502 with the standard error
//! envelope; backend-reported errors pass through untouched.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;

use super::error_response;

/// `ANY /proxy/{*path}` — forward to the backend.
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = target_url(&state.proxy.backend_url, &path, uri.query());

    let mut request = state.proxy.http.request(method, &target);
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        request = request.header(CONTENT_TYPE, content_type);
    }
    if !body.is_empty() {
        request = request.body(body.to_vec());
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(%target, error = %e, "proxy: backend unreachable");
            return error_response(StatusCode::BAD_GATEWAY, "proxy", e.to_string());
        }
    };

    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, "proxy", e.to_string()),
    };

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
}

/// Target URL: backend base + stripped path + original query string.
pub(crate) fn target_url(base: &str, path: &str, query: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match query {
        Some(query) => format!("{base}/{path}?{query}"),
        None => format!("{base}/{path}"),
    }
}

#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;
