// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic expiry scan.
//!
//! Each tick finds active images whose expiry timestamp has passed and
//! enqueues an expire task for each. The scanner never touches files or
//! rows itself -- the expire worker is the single canonical mutation path,
//! so the queue's retry and status bookkeeping covers scans too. A row
//! re-observed before its task runs just produces a duplicate task, which
//! the worker's compare-and-swap absorbs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use snapbin_core::SnapbinError;
use snapbin_storage::queries::images;
use snapbin_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::producer::TaskProducer;

/// Interval-driven producer of expire tasks.
pub struct ExpiryScanner {
    db: Arc<Database>,
    producer: TaskProducer,
    interval: Duration,
}

impl ExpiryScanner {
    pub fn new(db: Arc<Database>, producer: TaskProducer, interval: Duration) -> Self {
        Self {
            db,
            producer,
            interval,
        }
    }

    /// Scan on a fixed interval until `cancel` fires. The immediate first
    /// tick is skipped so startup is not a scan stampede.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await;

        info!(interval_secs = self.interval.as_secs(), "expiry scanner started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.scan_once().await {
                        warn!(error = %e, "expiry scan failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("expiry scanner shutting down");
                    break;
                }
            }
        }
    }

    /// One scan pass. Returns how many expire tasks were enqueued.
    pub async fn scan_once(&self) -> Result<usize, SnapbinError> {
        let lapsed = images::list_expired(&self.db, Utc::now()).await?;
        let count = lapsed.len();

        for image in lapsed {
            self.producer
                .enqueue_expire(image.id, &image.image_code, &image.file_path)
                .await?;
        }

        if count > 0 {
            info!(count, "enqueued expire tasks for lapsed images");
        }
        Ok(count)
    }
}
