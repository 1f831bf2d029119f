//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a client from the result.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use nexium_domain::NexiumError;
use nexium_infra::{config, NexiumClient};
use tempfile::NamedTempFile;

/// Write `contents` to a temp file carrying `extension`.
fn config_file(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    (temp_file, path)
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "api": {
            "base_url": "https://api.nexium.test",
            "request_timeout_secs": 12,
            "user_agent": "nexium-it/0.1"
        },
        "session": {
            "renewal_path": "/auth/refresh",
            "renewal_timeout_secs": 4,
            "refresh_interval_secs": 900
        },
        "logging": {
            "level": "nexium=debug",
            "json": true
        }
    }"#;
    let (_guard, path) = config_file(json_content, "json");

    let config = config::load_from_file(Some(path.clone())).expect("JSON config should load");

    assert_eq!(config.api.base_url, "https://api.nexium.test");
    assert_eq!(config.api.request_timeout(), Duration::from_secs(12));
    assert_eq!(config.api.user_agent.as_deref(), Some("nexium-it/0.1"));
    assert_eq!(config.session.renewal_path, "/auth/refresh");
    assert_eq!(config.session.renewal_timeout_secs, 4);
    assert_eq!(config.session.refresh_interval(), Some(Duration::from_secs(900)));
    assert_eq!(config.logging.level, "nexium=debug");
    assert!(config.logging.json);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
        [api]
        base_url = "http://localhost:9000"

        [session]
        renewal_timeout_secs = 8
    "#;
    let (_guard, path) = config_file(toml_content, "toml");

    let config = config::load_from_file(Some(path.clone())).expect("TOML config should load");

    assert_eq!(config.api.base_url, "http://localhost:9000");
    assert_eq!(config.session.renewal_timeout_secs, 8);
    // Missing fields fall back to defaults
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.session.renewal_path, "/api/session/refresh");
    assert_eq!(config.session.refresh_interval(), None);
    assert_eq!(config.logging.level, "info");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/nexium.json")));

    match result {
        Err(NexiumError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let (_guard, path) = config_file("{ not json", "json");

    match config::load_from_file(Some(path.clone())) {
        Err(NexiumError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_rejects_invalid_values() {
    let (_guard, path) =
        config_file(r#"{ "session": { "renewal_path": "api/session/refresh" } }"#, "json");

    match config::load_from_file(Some(path.clone())) {
        Err(NexiumError::Config(msg)) => assert!(msg.contains("renewal_path")),
        other => panic!("Expected Config error, got {other:?}"),
    }

    std::fs::remove_file(path).ok();
}

#[test]
fn test_unsupported_extension() {
    let (_guard, path) = config_file("api: {}", "yaml");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert!(err.to_string().contains("Unsupported config format"));

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_client_builds_from_loaded_config() {
    let (_guard, path) = config_file(
        r#"{ "api": { "base_url": "http://127.0.0.1:9" }, "session": { "refresh_interval_secs": 60 } }"#,
        "json",
    );
    let config = config::load_from_file(Some(path.clone())).expect("config should load");

    let client = NexiumClient::from_config(config.clone()).expect("client should build");

    assert_eq!(client.config(), &config);
    assert!(client.is_refreshing());
    client.shutdown().await.expect("refresher should stop");

    std::fs::remove_file(path).ok();
}
