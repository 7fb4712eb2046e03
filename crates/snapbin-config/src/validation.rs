// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as recognized backend names and non-empty paths.

use crate::model::SnapbinConfig;
use crate::ConfigError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const QUEUE_BACKENDS: &[&str] = &["redis", "memory"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SnapbinConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level must be one of {LOG_LEVELS:?}, got `{}`",
                config.server.log_level
            ),
        });
    }

    if let Some(ref secret) = config.auth.jwt_secret
        && secret.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "auth.jwt_secret must not be empty when set".to_string(),
        });
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.token_ttl_secs must be positive".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !QUEUE_BACKENDS.contains(&config.queue.backend.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.backend must be one of {QUEUE_BACKENDS:?}, got `{}`",
                config.queue.backend
            ),
        });
    }

    if config.queue.backend == "redis"
        && !config.queue.redis_url.starts_with("redis://")
        && !config.queue.redis_url.starts_with("rediss://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "queue.redis_url must start with redis:// or rediss://, got `{}`",
                config.queue.redis_url
            ),
        });
    }

    if config.queue.poll_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.poll_timeout_secs must be positive".to_string(),
        });
    }

    if config.queue.status_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "queue.status_ttl_secs must be positive".to_string(),
        });
    }

    if config.image.upload_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "image.upload_dir must not be empty".to_string(),
        });
    }

    if config.image.max_file_size_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "image.max_file_size_bytes must be positive".to_string(),
        });
    }

    if config.image.cleanup_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "image.cleanup_interval_secs must be positive".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
