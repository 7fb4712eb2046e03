// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the snapbin image host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level snapbin configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SnapbinConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// JWT authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task queue backend settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Image upload and expiry settings.
    #[serde(default)]
    pub image: ImageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_log_level() -> String {
    "info".to_string()
}

/// JWT authentication configuration.
///
/// `jwt_secret` has no default on purpose: the server refuses to start
/// without one rather than shipping a well-known signing key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HS256 signing secret. `None` prevents the server from starting.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    86_400 // 24 hours
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("snapbin").join("snapbin.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("snapbin.db"))
        .to_string_lossy()
        .into_owned()
}

/// Task queue backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Backend selection: "redis" (production) or "memory" (single-process dev).
    #[serde(default = "default_queue_backend")]
    pub backend: String,

    /// Redis connection URL, used when `backend = "redis"`.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Blocking-pop timeout for worker loops, in seconds. This bounds how
    /// long a shutdown signal waits for workers to notice it.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Lifetime of task status records, in seconds.
    #[serde(default = "default_status_ttl_secs")]
    pub status_ttl_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_queue_backend(),
            redis_url: default_redis_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            status_ttl_secs: default_status_ttl_secs(),
        }
    }
}

fn default_queue_backend() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    1
}

fn default_status_ttl_secs() -> u64 {
    86_400 // 24 hours
}

/// Image upload and expiry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Directory uploaded files are written to. Created on startup.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Interval between expiry scans, in seconds.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            max_file_size_bytes: default_max_file_size_bytes(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_upload_dir() -> String {
    "./uploads/images".to_string()
}

fn default_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_cleanup_interval_secs() -> u64 {
    3_600 // hourly, matching the original deployment cadence
}
