//! Search intent heuristics — pure functions over message text.
//!
//! DESIGN
//! ======
//! Deliberately lightweight string matching, not NLP: a fixed trigger-phrase
//! list and three ordered regex templates. Negated phrasing ("don't search
//! for ...") still triggers; that false positive is an accepted property of
//! the heuristic.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use super::SearchResult;

/// Phrases whose presence in user text indicates a need for search
/// augmentation. Matched case-insensitively by substring containment.
const SEARCH_TRIGGERS: &[&str] = &[
    "current",
    "recent",
    "latest",
    "today",
    "yesterday",
    "this week",
    "search for",
    "find information about",
    "look up",
    "web search",
    "internet search",
    "google",
];

fn query_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Imperative search phrasing: "search for X", "look up X".
            Regex::new(r"(?i)(?:search|find|look up) (?:for|information about)?\s*(.+?)(?:\?|\.|$)")
                .expect("imperative pattern compiles"),
            // Interrogative phrasing: "what is X", "how does X".
            Regex::new(r"(?i)(?:what|who|when|where|why|how) (?:is|are|was|were|did|does)\s+(.+?)(?:\?|\.|$)")
                .expect("interrogative pattern compiles"),
            // Request phrasing: "tell me about X".
            Regex::new(r"(?i)(?:tell me|show me|give me) (?:about|information about)?\s*(.+?)(?:\?|\.|$)")
                .expect("request pattern compiles"),
        ]
    })
}

// =============================================================================
// TRIGGER & EXTRACTION
// =============================================================================

/// True iff the lower-cased text contains any trigger phrase.
#[must_use]
pub fn should_use_search(text: &str) -> bool {
    let lower = text.to_lowercase();
    SEARCH_TRIGGERS.iter().any(|trigger| lower.contains(trigger))
}

/// Extract the search query from user text: first capture of the ordered
/// pattern attempts, else the text with `?`, `!` and `.` stripped.
#[must_use]
pub fn extract_search_query(text: &str) -> String {
    for pattern in query_patterns() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(query) = captures.get(1) {
                let query = query.as_str().trim();
                if !query.is_empty() {
                    return query.to_string();
                }
            }
        }
    }

    text.replace(['?', '.', '!'], "").trim().to_string()
}

// =============================================================================
// PROMPT COMPOSITION
// =============================================================================

/// Compose the augmented prompt: numbered result blocks followed by the
/// citation instruction. Empty results return the query unchanged, meaning
/// no augmentation was applied.
#[must_use]
pub fn format_search_prompt(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return query.to_string();
    }

    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[{}] Title: {}\nURL: {}\nSummary: {}\nSource: {}\n",
                i + 1,
                result.title,
                result.link,
                result.snippet,
                result.source
            )
        })
        .collect();

    format!(
        "User asked: \"{query}\"\n\nI found these recent search results:\n\n{}\n\
         Please provide a comprehensive answer based on these search results. \
         Cite specific sources using [1], [2], etc., when referencing information from them. \
         If the search results don't contain relevant information, acknowledge this and \
         provide the best answer you can based on your general knowledge.\n\nAnswer:",
        blocks.join("\n")
    )
}

// =============================================================================
// ADVANCED-MODE PLAN
// =============================================================================

/// The JSON object the model is asked to emit in advanced search mode.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPlan {
    #[serde(rename = "needsSearch")]
    pub needs_search: bool,
    #[serde(default)]
    pub queries: Vec<String>,
}

/// Parse the advanced-mode decision reply: a bare JSON object, optionally
/// inside a fenced code block. No retry, no schema repair; a malformed reply
/// is the caller's error.
///
/// # Errors
///
/// Returns the underlying JSON error when the reply does not deserialize
/// into a [`SearchPlan`].
pub fn parse_search_plan(reply: &str) -> Result<SearchPlan, serde_json::Error> {
    serde_json::from_str(strip_code_fence(reply))
}

/// A fenced ```json block reduced to its interior; other text is returned
/// trimmed as-is.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
#[path = "intent_test.rs"]
mod tests;
