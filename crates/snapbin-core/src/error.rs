// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the snapbin image host.

use thiserror::Error;

/// The primary error type used across all snapbin crates.
#[derive(Debug, Error)]
pub enum SnapbinError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Queue backend errors (connectivity, serialization). Surface synchronously
    /// to the producer's caller; worker-side occurrences feed the retry path.
    #[error("queue error: {message}")]
    Queue {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication failures (bad credentials, invalid or expired token).
    #[error("authentication error: {0}")]
    Auth(String),

    /// The requested entity does not exist (or its status record has lapsed).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request payload failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem errors from upload persistence and file removal.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SnapbinError {
    /// Shorthand for a `Queue` error without an underlying source.
    pub fn queue(message: impl Into<String>) -> Self {
        Self::Queue {
            message: message.into(),
            source: None,
        }
    }
}
