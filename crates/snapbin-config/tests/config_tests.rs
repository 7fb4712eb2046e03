// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading, merging, and validation.

use serial_test::serial;
use snapbin_config::{load_and_validate_str, load_config_from_str, SnapbinConfig};

#[test]
fn defaults_load_without_any_file() {
    let config = load_config_from_str("").expect("empty config should load defaults");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.log_level, "info");
    assert!(config.auth.jwt_secret.is_none());
    assert_eq!(config.auth.token_ttl_secs, 86_400);
    assert_eq!(config.queue.backend, "redis");
    assert_eq!(config.queue.redis_url, "redis://127.0.0.1:6379/0");
    assert_eq!(config.queue.poll_timeout_secs, 1);
    assert_eq!(config.queue.status_ttl_secs, 86_400);
    assert_eq!(config.image.upload_dir, "./uploads/images");
    assert_eq!(config.image.max_file_size_bytes, 10 * 1024 * 1024);
    assert_eq!(config.image.cleanup_interval_secs, 3_600);
}

#[test]
fn toml_sections_override_defaults() {
    let config = load_config_from_str(
        r#"
[server]
host = "0.0.0.0"
port = 9090

[auth]
jwt_secret = "test-secret"

[queue]
backend = "memory"
poll_timeout_secs = 2

[image]
upload_dir = "/var/lib/snapbin/uploads"
"#,
    )
    .unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.auth.jwt_secret.as_deref(), Some("test-secret"));
    assert_eq!(config.queue.backend, "memory");
    assert_eq!(config.queue.poll_timeout_secs, 2);
    assert_eq!(config.image.upload_dir, "/var/lib/snapbin/uploads");
    // Untouched sections keep their defaults.
    assert_eq!(config.storage.database_path, SnapbinConfig::default().storage.database_path);
}

#[test]
fn unknown_keys_are_rejected() {
    let result = load_config_from_str(
        r#"
[server]
hostname = "typo-for-host"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn unknown_section_is_rejected() {
    let result = load_config_from_str(
        r#"
[serverr]
port = 1234
"#,
    );
    assert!(result.is_err());
}

#[test]
fn validation_failure_surfaces_through_load_and_validate_str() {
    let errors = load_and_validate_str(
        r#"
[queue]
backend = "kafka"
"#,
    )
    .unwrap_err();
    assert!(errors.iter().any(|e| e.to_string().contains("queue.backend")));
}

#[test]
#[serial]
fn env_vars_override_toml_values() {
    // SAFETY: serialized test; no other thread reads the environment here.
    unsafe {
        std::env::set_var("SNAPBIN_QUEUE_REDIS_URL", "redis://queue.internal:6380/1");
        std::env::set_var("SNAPBIN_SERVER_PORT", "8200");
    }

    let config = snapbin_config::load_config().expect("env-driven config should load");
    assert_eq!(config.queue.redis_url, "redis://queue.internal:6380/1");
    assert_eq!(config.server.port, 8200);

    unsafe {
        std::env::remove_var("SNAPBIN_QUEUE_REDIS_URL");
        std::env::remove_var("SNAPBIN_SERVER_PORT");
    }
}

#[test]
#[serial]
fn env_mapping_preserves_underscored_key_names() {
    // SNAPBIN_IMAGE_MAX_FILE_SIZE_BYTES must map to image.max_file_size_bytes,
    // not image.max.file.size.bytes.
    unsafe {
        std::env::set_var("SNAPBIN_IMAGE_MAX_FILE_SIZE_BYTES", "1048576");
    }

    let config = snapbin_config::load_config().expect("env-driven config should load");
    assert_eq!(config.image.max_file_size_bytes, 1_048_576);

    unsafe {
        std::env::remove_var("SNAPBIN_IMAGE_MAX_FILE_SIZE_BYTES");
    }
}
