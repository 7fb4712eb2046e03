// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backend seam between the task pipeline and its key-value/list store.
//!
//! Producers and workers hold an `Arc<dyn TaskBackend>` constructed at
//! startup; nothing in the pipeline reaches for a global client handle.
//! Production uses [`crate::RedisBackend`]; tests and single-process dev
//! runs use [`crate::MemoryBackend`].

use std::time::Duration;

use async_trait::async_trait;
use snapbin_core::SnapbinError;
use tokio::sync::mpsc;

/// Queue, status-store, and result-channel operations.
///
/// Payloads are opaque strings at this layer; serialization stays with the
/// producer/worker so backends cannot diverge on wire format.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Append a payload to the tail of the named queue. Durable until popped.
    async fn push(&self, queue: &str, payload: &str) -> Result<(), SnapbinError>;

    /// Pop from the head of the named queue, blocking up to `timeout`.
    ///
    /// Returns `Ok(None)` on timeout -- emptiness is not an error, it is the
    /// worker loop's cooperative cancellation check point. A popped payload
    /// is gone from the queue immediately; there is no acknowledgment.
    async fn pop_blocking(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> Result<Option<String>, SnapbinError>;

    /// Overwrite the status record at `key` and reset its TTL.
    async fn put_status(&self, key: &str, payload: &str, ttl: Duration)
        -> Result<(), SnapbinError>;

    /// Read the status record at `key`. `Ok(None)` covers both
    /// never-existed and TTL-lapsed; the two are indistinguishable.
    async fn get_status(&self, key: &str) -> Result<Option<String>, SnapbinError>;

    /// Fire-and-forget broadcast. Subscribers not listening at publish time
    /// miss the message; the status store is the durable fallback.
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), SnapbinError>;

    /// Tap the named channel. Messages published after this call are
    /// delivered best-effort to the returned receiver.
    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<String>, SnapbinError>;
}
