use super::*;

// =========================================================================
// parse_tags_response
// =========================================================================

#[test]
fn tags_parse_full_entry() {
    let json = serde_json::json!({
        "models": [{
            "name": "llama3.2:3b",
            "size": 1_900_000_000u64,
            "modified_at": "2025-05-01T10:00:00Z",
            "digest": "sha256:abc",
            "details": {
                "format": "gguf",
                "family": "llama",
                "families": ["llama"],
                "parameter_size": "3B",
                "quantization_level": "Q4_K_M"
            }
        }]
    })
    .to_string();
    let models = parse_tags_response(&json).unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "llama3.2:3b");
    assert_eq!(models[0].details.parameter_size, "3B");
}

#[test]
fn tags_parse_missing_models_is_empty() {
    let models = parse_tags_response("{}").unwrap();
    assert!(models.is_empty());
}

#[test]
fn tags_parse_invalid_json_errors() {
    assert!(matches!(parse_tags_response("not json"), Err(OllamaError::Parse(_))));
}

// =========================================================================
// parse_chat_response
// =========================================================================

#[test]
fn chat_parse_reply_content() {
    let json = r#"{"model":"demo","message":{"role":"assistant","content":"hi there"},"done":true}"#;
    assert_eq!(parse_chat_response(json).unwrap(), "hi there");
}

#[test]
fn chat_parse_missing_message_errors() {
    let err = parse_chat_response(r#"{"model":"demo","done":true}"#).unwrap_err();
    assert!(matches!(err, OllamaError::Parse(_)));
    assert!(err.to_string().contains("missing message"));
}

#[test]
fn chat_parse_invalid_json_errors() {
    assert!(matches!(parse_chat_response("<html>"), Err(OllamaError::Parse(_))));
}

// =========================================================================
// progress_for_bytes
// =========================================================================

#[test]
fn progress_rounds_to_nearest_percent() {
    assert_eq!(progress_for_bytes(0), 0);
    assert_eq!(progress_for_bytes(4_999_999), 0);
    assert_eq!(progress_for_bytes(5_000_000), 1);
    assert_eq!(progress_for_bytes(10_000_000), 1);
    assert_eq!(progress_for_bytes(250_000_000), 25);
}

#[test]
fn progress_caps_at_one_hundred() {
    assert_eq!(progress_for_bytes(1_000_000_000), 100);
    assert_eq!(progress_for_bytes(u64::MAX), 100);
}
