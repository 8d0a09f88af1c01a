use super::*;

#[test]
fn reply_without_block_has_no_action() {
    assert!(extract_action("Just a normal answer.").unwrap().is_none());
}

#[test]
fn unclosed_fence_is_not_a_block() {
    assert!(extract_action("text ```json {\"action\":").unwrap().is_none());
}

#[test]
fn well_formed_block_parses() {
    let reply = "Updated the catalog for you.\n\n```json\n{\"action\": \"update\", \"target\": \"catalog\", \"data\": {\"productName\": \"Auger\"}}\n```";
    let action = extract_action(reply).unwrap().unwrap();
    assert_eq!(action.action, ActionVerb::Update);
    assert_eq!(action.target, "catalog");
    assert_eq!(action.data["productName"], serde_json::json!("Auger"));
}

#[test]
fn last_block_wins() {
    let reply = "```json\n{\"action\":\"create\",\"target\":\"a\"}\n```\ntext\n```json\n{\"action\":\"delete\",\"target\":\"b\"}\n```";
    let action = extract_action(reply).unwrap().unwrap();
    assert_eq!(action.action, ActionVerb::Delete);
    assert_eq!(action.target, "b");
}

#[test]
fn missing_data_defaults_to_null() {
    let reply = "```json\n{\"action\":\"delete\",\"target\":\"products\"}\n```";
    let action = extract_action(reply).unwrap().unwrap();
    assert!(action.data.is_null());
}

#[test]
fn malformed_block_is_an_error() {
    assert!(extract_action("```json\nnot json\n```").is_err());
}

#[test]
fn unknown_verb_is_an_error() {
    assert!(extract_action("```json\n{\"action\":\"explode\",\"target\":\"x\"}\n```").is_err());
}
