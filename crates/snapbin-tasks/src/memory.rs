// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process `TaskBackend` for tests and Redis-less development runs.
//!
//! Mirrors the Redis semantics the pipeline relies on: FIFO lists with
//! blocking pop, TTL'd status records, and fire-and-forget pub/sub where
//! messages published with no live subscriber are dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use snapbin_core::SnapbinError;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::time::Instant;

use crate::backend::TaskBackend;

#[derive(Default)]
struct QueueSlot {
    items: VecDeque<String>,
    notify: Arc<Notify>,
}

/// In-memory queue/status/pub-sub store.
///
/// All locks are short-lived std mutexes; nothing is held across an await.
#[derive(Default)]
pub struct MemoryBackend {
    queues: Mutex<HashMap<String, QueueSlot>>,
    statuses: Mutex<HashMap<String, (String, Instant)>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads currently waiting in the named queue.
    pub fn queue_len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .get(queue)
            .map(|slot| slot.items.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TaskBackend for MemoryBackend {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), SnapbinError> {
        let mut queues = self.queues.lock().expect("queue lock poisoned");
        let slot = queues.entry(queue.to_string()).or_default();
        slot.items.push_back(payload.to_string());
        slot.notify.notify_one();
        Ok(())
    }

    async fn pop_blocking(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> Result<Option<String>, SnapbinError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Take the notify handle while holding the lock so a push between
            // the check and the wait still stores a wakeup permit.
            let notify = {
                let mut queues = self.queues.lock().expect("queue lock poisoned");
                let slot = queues.entry(queue.to_string()).or_default();
                if let Some(payload) = slot.items.pop_front() {
                    return Ok(Some(payload));
                }
                Arc::clone(&slot.notify)
            };

            tokio::select! {
                _ = notify.notified() => {}
                _ = tokio::time::sleep_until(deadline) => return Ok(None),
            }
        }
    }

    async fn put_status(
        &self,
        key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), SnapbinError> {
        let expires_at = Instant::now() + ttl;
        self.statuses
            .lock()
            .expect("status lock poisoned")
            .insert(key.to_string(), (payload.to_string(), expires_at));
        Ok(())
    }

    async fn get_status(&self, key: &str) -> Result<Option<String>, SnapbinError> {
        let mut statuses = self.statuses.lock().expect("status lock poisoned");
        match statuses.get(key) {
            Some((payload, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(payload.clone()))
            }
            Some(_) => {
                statuses.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), SnapbinError> {
        let channels = self.channels.lock().expect("channel lock poisoned");
        if let Some(sender) = channels.get(channel) {
            // A send error just means no live subscriber -- fire and forget.
            let _ = sender.send(payload.to_string());
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<String>, SnapbinError> {
        let mut broadcast_rx = {
            let mut channels = self.channels.lock().expect("channel lock poisoned");
            channels
                .entry(channel.to_string())
                .or_insert_with(|| broadcast::channel(64).0)
                .subscribe()
        };

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_pop_preserves_fifo_order() {
        let backend = MemoryBackend::new();
        backend.push("q", "first").await.unwrap();
        backend.push("q", "second").await.unwrap();

        let a = backend.pop_blocking("q", Duration::from_millis(50)).await.unwrap();
        let b = backend.pop_blocking("q", Duration::from_millis(50)).await.unwrap();
        assert_eq!(a.as_deref(), Some("first"));
        assert_eq!(b.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn pop_times_out_on_empty_queue() {
        let backend = MemoryBackend::new();
        let popped = backend
            .pop_blocking("empty", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(popped.is_none());
    }

    #[tokio::test]
    async fn pop_wakes_when_a_push_arrives_mid_wait() {
        let backend = Arc::new(MemoryBackend::new());
        let popper = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                backend.pop_blocking("q", Duration::from_secs(5)).await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        backend.push("q", "late-arrival").await.unwrap();

        let popped = popper.await.unwrap().unwrap();
        assert_eq!(popped.as_deref(), Some("late-arrival"));
    }

    #[tokio::test]
    async fn status_expires_after_ttl() {
        let backend = MemoryBackend::new();
        backend
            .put_status("task:status:x", "payload", Duration::from_millis(30))
            .await
            .unwrap();

        assert!(backend.get_status("task:status:x").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(backend.get_status("task:status:x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_status_overwrites_and_resets_ttl() {
        let backend = MemoryBackend::new();
        backend
            .put_status("k", "old", Duration::from_millis(30))
            .await
            .unwrap();
        backend
            .put_status("k", "new", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(backend.get_status("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn publish_reaches_live_subscribers_only() {
        let backend = MemoryBackend::new();
        backend.publish("ch", "missed").await.unwrap();

        let mut rx = backend.subscribe("ch").await.unwrap();
        backend.publish("ch", "seen").await.unwrap();

        let received = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .unwrap();
        assert_eq!(received.as_deref(), Some("seen"));
    }
}
