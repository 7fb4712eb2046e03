// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./snapbin.toml` > `~/.config/snapbin/snapbin.toml`
//! > `/etc/snapbin/snapbin.toml`, with environment variable overrides via the
//! `SNAPBIN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SnapbinConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/snapbin/snapbin.toml` (system-wide)
/// 3. `~/.config/snapbin/snapbin.toml` (user XDG config)
/// 4. `./snapbin.toml` (local directory)
/// 5. `SNAPBIN_*` environment variables
pub fn load_config() -> Result<SnapbinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SnapbinConfig::default()))
        .merge(Toml::file("/etc/snapbin/snapbin.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("snapbin/snapbin.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("snapbin.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SnapbinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SnapbinConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SnapbinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SnapbinConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `SNAPBIN_QUEUE_REDIS_URL` must map to
/// `queue.redis_url`, not `queue.redis.url`.
fn env_provider() -> Env {
    Env::prefixed("SNAPBIN_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: SNAPBIN_QUEUE_REDIS_URL -> "queue_redis_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("image_", "image.", 1);
        mapped.into()
    })
}
