//! Assistant action extraction.
//!
//! An assistant reply may end with a fenced ```json block carrying a CRUD
//! action over the reference documents. A reply with no block is the common
//! case. A block that is present but malformed is a hard parse error: the
//! model was asked for an exact shape, and there is no repair step.

use serde::{Deserialize, Serialize};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVerb {
    Create,
    Update,
    Delete,
}

/// A structured action emitted at the end of an assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantAction {
    pub action: ActionVerb,
    pub target: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Extract the trailing action block from an assistant reply, if any.
///
/// # Errors
///
/// Returns the JSON error when a block is present but does not deserialize
/// into an [`AssistantAction`].
pub fn extract_action(reply: &str) -> Result<Option<AssistantAction>, serde_json::Error> {
    let Some(block) = trailing_json_block(reply) else {
        return Ok(None);
    };
    serde_json::from_str(block).map(Some)
}

/// The interior of the last complete ```json fenced block, if one exists.
fn trailing_json_block(reply: &str) -> Option<&str> {
    let start = reply.rfind("```json")?;
    let body = &reply[start + "```json".len()..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;
