use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.model.base_url, "http://127.0.0.1:11434/v1");
    assert_eq!(config.model.model, "llama3.2");
    assert!(config.model.api_key.is_none());
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.chunking.budget_chars, 3800);
}

#[test]
fn test_retry_config_default() {
    let retry = RetryConfig::default();
    assert_eq!(retry.initial_delay_ms, 1000);
    assert_eq!(retry.backoff_multiplier, 2.0);
    assert_eq!(retry.max_delay_ms, 30_000);
}

#[test]
fn test_store_config_default() {
    let store = StoreConfig::default();
    assert!(store.enabled);
    assert_eq!(store.ttl_hours, 24);
    assert_eq!(store.sweep_interval_hours, 12);
    assert!(store.path.ends_with("store.json"));
}

#[test]
fn test_logging_config_default() {
    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert!(logging.file);
    assert!(logging.directory.ends_with("logs"));
}

#[test]
fn test_chunking_from_json() {
    let json = r#"{"budget_chars": 1200}"#;
    let chunking: ChunkingConfig = serde_json::from_str(json).unwrap();
    assert_eq!(chunking.budget_chars, 1200);
    assert_eq!(chunking.max_resummarize_passes, 3);
}

#[test]
fn test_model_config_skips_missing_key() {
    let json = serde_json::to_value(ModelConfig::default()).unwrap();
    assert!(json.get("api_key").is_none());
    assert!(json.get("temperature").is_none());
}
