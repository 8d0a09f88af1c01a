use super::*;
use crate::db::test_helpers::test_pool;

// =========================================================================
// merge
// =========================================================================

#[test]
fn merge_empty_blob_yields_defaults() {
    let settings = merge(&serde_json::json!({}));
    assert_eq!(settings, Settings::default());
}

#[test]
fn merge_non_object_yields_defaults() {
    assert_eq!(merge(&serde_json::json!("nope")), Settings::default());
    assert_eq!(merge(&serde_json::json!(42)), Settings::default());
}

#[test]
fn merge_stored_values_override_defaults() {
    let settings = merge(&serde_json::json!({
        "apiUrl": "http://10.0.0.5:11434",
        "enableWebSearch": true,
        "maxSearchResults": 5
    }));
    assert_eq!(settings.api_url, "http://10.0.0.5:11434");
    assert!(settings.enable_web_search);
    assert_eq!(settings.max_search_results, 5);
    // Untouched fields keep their defaults.
    assert_eq!(settings.max_tokens, 2048);
    assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
}

#[test]
fn merge_coerces_numeric_strings() {
    let settings = merge(&serde_json::json!({
        "maxTokens": "4096",
        "temperature": "0.2",
        "searchTimeoutSecs": " 30 "
    }));
    assert_eq!(settings.max_tokens, 4096);
    assert!((settings.temperature - 0.2).abs() < f64::EPSILON);
    assert_eq!(settings.search_timeout_secs, 30);
}

#[test]
fn merge_ignores_wrong_shapes() {
    let settings = merge(&serde_json::json!({
        "maxTokens": "not a number",
        "enableWebSearch": "yes",
        "apiUrl": 17
    }));
    assert_eq!(settings, Settings::default());
}

#[test]
fn merge_parses_search_mode() {
    assert_eq!(merge(&serde_json::json!({"searchMode": "advanced"})).search_mode, SearchMode::Advanced);
    assert_eq!(merge(&serde_json::json!({"searchMode": "simple"})).search_mode, SearchMode::Simple);
    assert_eq!(merge(&serde_json::json!({"searchMode": "bogus"})).search_mode, SearchMode::Simple);
}

// =========================================================================
// load / save
// =========================================================================

#[tokio::test]
async fn load_without_stored_blob_is_default() {
    let pool = test_pool().await;
    assert_eq!(load(&pool).await.unwrap(), Settings::default());
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let pool = test_pool().await;
    let settings = Settings {
        model: "llama3.2:3b".to_string(),
        enable_web_search: true,
        search_mode: SearchMode::Advanced,
        ..Settings::default()
    };
    save(&pool, &settings).await.unwrap();
    assert_eq!(load(&pool).await.unwrap(), settings);
}

#[tokio::test]
async fn load_merges_partial_stored_blob() {
    let pool = test_pool().await;
    crate::db::kv_put(&pool, crate::db::KEY_SETTINGS, &serde_json::json!({"model": "mistral:7b"}))
        .await
        .unwrap();
    let settings = load(&pool).await.unwrap();
    assert_eq!(settings.model, "mistral:7b");
    assert_eq!(settings.api_url, DEFAULT_API_URL);
}
