//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use arena_client::config::{ClientConfig, GameConfig, LoggingConfig, MAX_FRAME_LENGTH};
use arena_client::ProtocolError;
use std::collections::HashMap;
use std::time::Duration;
use tracing::Level;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_default_config_validates() {
    let config = GameConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert_eq!(config.client.max_frame_length, MAX_FRAME_LENGTH);
}

#[test]
fn test_short_connect_timeout() {
    let mut config = GameConfig::default();
    config.client.connect_timeout = Duration::from_millis(50);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Connect timeout too short")));
}

#[test]
fn test_long_connect_timeout() {
    let mut config = GameConfig::default();
    config.client.connect_timeout = Duration::from_secs(301);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Connect timeout too long")));
}

#[test]
fn test_short_read_and_write_timeouts() {
    let config = GameConfig::default_with_overrides(|c| {
        c.client.read_timeout = Duration::from_millis(10);
        c.client.write_timeout = Duration::from_millis(1);
    });

    let errors = config.validate();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors.iter().any(|e| e.contains("Read timeout too short")));
    assert!(errors.iter().any(|e| e.contains("Write timeout too short")));
}

#[test]
fn test_frame_length_bounds() {
    let small = ClientConfig {
        max_frame_length: 100,
        ..ClientConfig::default()
    };
    assert!(small
        .validate()
        .iter()
        .any(|e| e.contains("Max frame length too small")));

    let large = ClientConfig {
        max_frame_length: 128 * 1024 * 1024,
        ..ClientConfig::default()
    };
    assert!(large
        .validate()
        .iter()
        .any(|e| e.contains("Max frame length too large")));
}

#[test]
fn test_empty_app_name() {
    let logging = LoggingConfig {
        app_name: String::new(),
        ..LoggingConfig::default()
    };
    assert!(logging
        .validate()
        .iter()
        .any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_validate_strict_collects_every_problem() {
    let config = GameConfig::default_with_overrides(|c| {
        c.client.connect_timeout = Duration::from_millis(1);
        c.logging.app_name = "x".repeat(65);
    });

    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("Connect timeout too short"));
            assert!(msg.contains("Application name too long"));
        }
        other => panic!("expected config error, got {other:?}"),
    }
    assert!(GameConfig::default().validate_strict().is_ok());
}

#[test]
fn test_from_toml() {
    let config = GameConfig::from_toml(
        r#"
        [client]
        connect_timeout = 1500
        read_timeout = 4000
        write_timeout = 2000
        max_frame_length = 65536

        [logging]
        app_name = "bot-7"
        log_level = "debug"
        json_format = true
        "#,
    )
    .unwrap();

    assert_eq!(config.client.connect_timeout, Duration::from_millis(1500));
    assert_eq!(config.client.read_timeout, Duration::from_secs(4));
    assert_eq!(config.client.max_frame_length, 65536);
    assert_eq!(config.logging.app_name, "bot-7");
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);
}

#[test]
fn test_from_toml_empty_uses_defaults() {
    let config = GameConfig::from_toml("").unwrap();
    assert_eq!(
        config.client.read_timeout,
        ClientConfig::default().read_timeout
    );
    assert_eq!(config.logging.app_name, "arena-client");
}

#[test]
fn test_from_toml_partial_tables() {
    let config = GameConfig::from_toml(
        r#"
        [client]
        read_timeout = 500

        [logging]
        json_format = true
        "#,
    )
    .unwrap();

    let defaults = ClientConfig::default();
    assert_eq!(config.client.read_timeout, Duration::from_millis(500));
    assert_eq!(config.client.connect_timeout, defaults.connect_timeout);
    assert_eq!(config.client.max_frame_length, defaults.max_frame_length);
    assert_eq!(config.logging.app_name, "arena-client");
    assert!(config.logging.json_format);
}

#[test]
fn test_from_toml_rejects_bad_level() {
    let result = GameConfig::from_toml(
        r#"
        [logging]
        app_name = "bot"
        log_level = "loud"
        json_format = false
        "#,
    );
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_example_config_parses_back() {
    let example = GameConfig::example_config();
    let parsed = GameConfig::from_toml(&example).unwrap();
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_env_overrides() {
    let mut config = GameConfig::default();
    config
        .apply_env(env(&[
            ("CONNECT_TIMEOUT_MS", "750"),
            ("READ_TIMEOUT_MS", "3000"),
            ("MAX_FRAME_LENGTH", "4096"),
            ("LOG_LEVEL", "warn"),
            ("LOG_JSON", "true"),
        ]))
        .unwrap();

    assert_eq!(config.client.connect_timeout, Duration::from_millis(750));
    assert_eq!(config.client.read_timeout, Duration::from_secs(3));
    assert_eq!(
        config.client.write_timeout,
        ClientConfig::default().write_timeout
    );
    assert_eq!(config.client.max_frame_length, 4096);
    assert_eq!(config.logging.log_level, Level::WARN);
    assert!(config.logging.json_format);
}

#[test]
fn test_env_rejects_garbage() {
    let mut config = GameConfig::default();
    let err = config
        .apply_env(env(&[("READ_TIMEOUT_MS", "soon")]))
        .unwrap_err();
    assert!(err.to_string().contains("READ_TIMEOUT_MS"));
}
