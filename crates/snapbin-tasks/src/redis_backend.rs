// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis `TaskBackend`: RPUSH/BLPOP lists, SET-EX status keys, pub/sub
//! result channels.
//!
//! One multiplexed connection serves push/status/publish traffic. Blocking
//! pops get a dedicated connection per queue -- BLPOP parks the connection it
//! runs on, and the shared pipeline must never stall behind it. Each queue
//! has exactly one consumer, so the per-queue connection is uncontended.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use snapbin_core::SnapbinError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::backend::TaskBackend;

/// Redis-backed queue/status/pub-sub store.
pub struct RedisBackend {
    client: redis::Client,
    conn: MultiplexedConnection,
    pop_conns: Mutex<HashMap<String, MultiplexedConnection>>,
}

impl RedisBackend {
    /// Connect to Redis at `url` and verify the connection with a PING.
    pub async fn connect(url: &str) -> Result<Self, SnapbinError> {
        let client = redis::Client::open(url).map_err(|e| map_err("invalid redis url", e))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_err("redis connect failed", e))?;

        let _: () = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| map_err("redis ping failed", e))?;

        debug!(url, "redis backend connected");
        Ok(Self {
            client,
            conn,
            pop_conns: Mutex::new(HashMap::new()),
        })
    }

    /// The dedicated blocking-pop connection for `queue`, created on first use.
    async fn pop_conn(&self, queue: &str) -> Result<MultiplexedConnection, SnapbinError> {
        let mut pop_conns = self.pop_conns.lock().await;
        if let Some(conn) = pop_conns.get(queue) {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_err("redis pop connection failed", e))?;
        pop_conns.insert(queue.to_string(), conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl TaskBackend for RedisBackend {
    async fn push(&self, queue: &str, payload: &str) -> Result<(), SnapbinError> {
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| map_err("rpush failed", e))
    }

    async fn pop_blocking(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> Result<Option<String>, SnapbinError> {
        let mut conn = self.pop_conn(queue).await?;
        // BLPOP replies nil on timeout; a hit is (key, payload).
        let reply: Option<(String, String)> = conn
            .blpop(queue, timeout.as_secs_f64())
            .await
            .map_err(|e| map_err("blpop failed", e))?;
        Ok(reply.map(|(_, payload)| payload))
    }

    async fn put_status(
        &self,
        key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), SnapbinError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, payload, ttl.as_secs().max(1))
            .await
            .map_err(|e| map_err("set_ex failed", e))
    }

    async fn get_status(&self, key: &str) -> Result<Option<String>, SnapbinError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| map_err("get failed", e))
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<(), SnapbinError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| map_err("publish failed", e))
    }

    async fn subscribe(&self, channel: &str) -> Result<mpsc::Receiver<String>, SnapbinError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| map_err("pubsub connect failed", e))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| map_err("subscribe failed", e))?;

        let (tx, rx) = mpsc::channel(64);
        let channel = channel.to_string();
        tokio::spawn(async move {
            let mut stream = pubsub.into_on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(channel, error = %e, "dropping undecodable pubsub message");
                        continue;
                    }
                };
                if tx.send(payload).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

fn map_err(context: &str, e: redis::RedisError) -> SnapbinError {
    SnapbinError::Queue {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}
