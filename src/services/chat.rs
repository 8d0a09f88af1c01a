//! Request orchestrator — message history + model in, one assistant reply out.
//!
//! DESIGN
//! ======
//! `ChatOrchestrator` owns the send lifecycle: decide whether the prompt
//! needs web augmentation, run the search round(s), rewrite the outbound
//! message list, and issue exactly one inference call with streaming
//! disabled. Loading flag, last error, and last search context are kept in
//! an observable status slot so the surrounding application can render them
//! without participating in the call.
//!
//! TRADE-OFFS
//! ==========
//! The loading flag is observational only; nothing stops a second concurrent
//! send, and callers gate their own submit path. A failed inference call
//! after a successful search keeps the search context populated, so partial
//! progress stays visible next to the error.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::ollama::{ApiMessage, OllamaChat, OllamaError};
use crate::search::intent::{extract_search_query, format_search_prompt, parse_search_plan, should_use_search};
use crate::search::{SearchContext, SearchError, SearchRequest, WebSearch};
use crate::services::settings::{SearchMode, Settings};
use crate::services::store::{ChatMessage, Role};

/// Most queries the advanced-mode plan may fan out to.
const MAX_PLAN_QUERIES: usize = 3;

/// System instruction for the advanced-mode decision sub-call.
const SEARCH_PLANNER_PROMPT: &str = "You decide whether a user message needs a web search before it can be \
     answered. Reply with a single JSON object and nothing else: \
     {\"needsSearch\": boolean, \"queries\": [string]}. Include at most 3 \
     queries. If no search is needed, reply {\"needsSearch\": false, \
     \"queries\": []}.";

/// System instruction prepended when search context is injected.
const SEARCH_CONTEXT_PROMPT: &str = "Web search results are included in the user's message. Answer using only \
     the supplied search context and cite sources with bracketed indices like \
     [1]. If the context does not cover the question, say so instead of \
     guessing.";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No messages were supplied.
    #[error("no messages to send")]
    EmptyInput,
    /// The inference endpoint failed (unreachable, non-2xx, malformed body).
    #[error("inference failed: {0}")]
    Inference(#[from] OllamaError),
    /// The search round failed (credentials, HTTP, provider error, timeout).
    #[error("web search failed: {0}")]
    Search(#[from] SearchError),
    /// A structured reply expected from the model did not parse.
    #[error("malformed model output: {0}")]
    Parse(String),
}

// =============================================================================
// STATUS
// =============================================================================

/// Observable orchestrator state for the surrounding application.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorStatus {
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub search_context: Option<SearchContext>,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

pub struct ChatOrchestrator {
    ollama: Arc<dyn OllamaChat>,
    search: Option<Arc<dyn WebSearch>>,
    status: Mutex<OrchestratorStatus>,
}

impl ChatOrchestrator {
    #[must_use]
    pub fn new(ollama: Arc<dyn OllamaChat>, search: Option<Arc<dyn WebSearch>>) -> Self {
        Self { ollama, search, status: Mutex::new(OrchestratorStatus::default()) }
    }

    /// Snapshot of the observable status slot.
    #[must_use]
    pub fn status(&self) -> OrchestratorStatus {
        self.lock_status().clone()
    }

    /// Turn a message history and model selection into one assistant reply,
    /// optionally enriched by web search context.
    ///
    /// # Errors
    ///
    /// Returns a [`ChatError`]; the same message is retained in the status
    /// slot. Errors are terminal for the call; nothing is retried.
    pub async fn send_message(
        &self,
        settings: &Settings,
        memory: Option<&str>,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, ChatError> {
        self.begin();
        let result = self.send_inner(settings, memory, messages, model).await;
        self.finish(result.as_ref().err());
        result
    }

    async fn send_inner(
        &self,
        settings: &Settings,
        memory: Option<&str>,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        info!(%model, count = messages.len(), "chat: send requested");

        let mut outbound: Vec<ChatMessage> = messages.to_vec();

        if settings.enable_memory {
            if let Some(docs) = memory {
                outbound.insert(0, memory_message(settings, docs));
            }
        }

        let queries = self.plan_queries(settings, messages, model).await?;
        if !queries.is_empty() {
            let context = self.run_searches(settings, &queries).await?;
            info!(query = %context.query, results = context.results.len(), "chat: search round complete");
            let augment = !context.results.is_empty();
            self.record_search(context.clone());
            if augment {
                outbound = inject_search_context(&outbound, &context);
            }
        }

        let wire: Vec<ApiMessage> = outbound
            .iter()
            .map(|m| ApiMessage::new(m.role.as_str(), m.content.clone()))
            .collect();
        let reply = self.ollama.chat(model, &wire).await?;
        info!(%model, reply_len = reply.len(), "chat: reply received");
        Ok(reply)
    }

    // =========================================================================
    // QUERY PLANNING
    // =========================================================================

    async fn plan_queries(
        &self,
        settings: &Settings,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Vec<String>, ChatError> {
        if !settings.enable_web_search || self.search.is_none() {
            return Ok(Vec::new());
        }
        let Some(last) = messages.last().map(|m| m.content.as_str()) else {
            return Ok(Vec::new());
        };

        match settings.search_mode {
            SearchMode::Simple => {
                if should_use_search(last) {
                    Ok(vec![extract_search_query(last)])
                } else {
                    Ok(Vec::new())
                }
            }
            SearchMode::Advanced => {
                let decision = [
                    ApiMessage::new(Role::System.as_str(), SEARCH_PLANNER_PROMPT),
                    ApiMessage::new(Role::User.as_str(), last),
                ];
                let reply = self.ollama.chat(model, &decision).await?;
                let plan = parse_search_plan(&reply)
                    .map_err(|e| ChatError::Parse(format!("search plan: {e}")))?;
                if plan.needs_search {
                    Ok(plan.queries.into_iter().take(MAX_PLAN_QUERIES).collect())
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    // =========================================================================
    // SEARCH ROUNDS
    // =========================================================================

    async fn run_searches(&self, settings: &Settings, queries: &[String]) -> Result<SearchContext, ChatError> {
        let Some(search) = &self.search else {
            return Err(ChatError::Search(SearchError::NotConfigured));
        };

        let mut results = Vec::new();
        let mut seen_links = HashSet::new();
        for query in queries {
            let request = SearchRequest {
                query,
                api_key: &settings.google_api_key,
                engine_id: &settings.google_search_engine_id,
                max_results: settings.max_search_results,
            };

            // The timeout race applies to the simple path only; advanced-mode
            // rounds run to completion or failure.
            let batch = if settings.search_mode == SearchMode::Simple {
                let deadline = Duration::from_secs(settings.search_timeout_secs);
                match tokio::time::timeout(deadline, search.search(request)).await {
                    Ok(outcome) => outcome?,
                    Err(_) => {
                        warn!(%query, secs = settings.search_timeout_secs, "chat: search timed out");
                        return Err(ChatError::Search(SearchError::Timeout(settings.search_timeout_secs)));
                    }
                }
            } else {
                search.search(request).await?
            };

            for result in batch {
                if seen_links.insert(result.link.clone()) {
                    results.push(result);
                }
            }
        }

        Ok(SearchContext { query: queries[0].clone(), results, timestamp: OffsetDateTime::now_utc() })
    }

    // =========================================================================
    // STATUS SLOT
    // =========================================================================

    fn begin(&self) {
        let mut status = self.lock_status();
        status.is_loading = true;
        status.last_error = None;
        status.search_context = None;
    }

    fn finish(&self, error: Option<&ChatError>) {
        let mut status = self.lock_status();
        status.is_loading = false;
        if let Some(error) = error {
            warn!(error = %error, "chat: send failed");
            status.last_error = Some(error.to_string());
        }
    }

    fn record_search(&self, context: SearchContext) {
        self.lock_status().search_context = Some(context);
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, OrchestratorStatus> {
        self.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// =============================================================================
// MESSAGE COMPOSITION
// =============================================================================

fn memory_message(settings: &Settings, docs: &str) -> ChatMessage {
    let content = if settings.system_prompt.is_empty() {
        format!("Reference documents:\n{docs}")
    } else {
        format!("{}\n\nReference documents:\n{docs}", settings.system_prompt)
    };
    ChatMessage::new(Role::System, content)
}

/// Rewrite the last user message with the composed search prompt and prepend
/// the answer-from-context instruction. The last message is replaced
/// wholesale, not patched.
pub(crate) fn inject_search_context(messages: &[ChatMessage], context: &SearchContext) -> Vec<ChatMessage> {
    let prompt = format_search_prompt(&context.query, &context.results);

    let mut rewritten = Vec::with_capacity(messages.len() + 1);
    rewritten.push(ChatMessage::new(Role::System, SEARCH_CONTEXT_PROMPT));
    if let Some((last, rest)) = messages.split_last() {
        rewritten.extend(rest.iter().cloned());
        rewritten.push(ChatMessage { id: last.id, role: last.role, content: prompt, timestamp: last.timestamp });
    }
    rewritten
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
