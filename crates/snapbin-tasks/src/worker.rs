// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker loops driving the task state machine.
//!
//! One worker per task kind, each single-threaded in its own processing
//! order. The state machine is `pending -> processing -> completed`, with
//! failures cycling back to `pending` until the retry cap, then `failed`.
//! Terminal states are never re-entered for the same task id.
//!
//! Side-effect errors never escape the loop: they become retry or terminal
//! transitions. Only the blocking pop suspends, so a cancellation signal is
//! honored within one poll timeout.

use std::sync::Arc;
use std::time::Duration;

use snapbin_core::{SnapbinError, Task, TaskKind, TaskResult, TaskStatus, MAX_RETRIES};
use snapbin_storage::queries::images;
use snapbin_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::TaskBackend;
use crate::keys;

/// Consumer loop for one task kind.
pub struct TaskWorker {
    kind: TaskKind,
    backend: Arc<dyn TaskBackend>,
    db: Arc<Database>,
    poll_timeout: Duration,
    status_ttl: Duration,
}

impl TaskWorker {
    pub fn new(
        kind: TaskKind,
        backend: Arc<dyn TaskBackend>,
        db: Arc<Database>,
        poll_timeout: Duration,
        status_ttl: Duration,
    ) -> Self {
        Self {
            kind,
            backend,
            db,
            poll_timeout,
            status_ttl,
        }
    }

    /// Poll the kind's queue until `cancel` fires.
    ///
    /// An in-flight side effect is not interrupted by cancellation; only the
    /// next iteration is prevented.
    pub async fn run(self, cancel: CancellationToken) {
        let queue = keys::queue_key(self.kind);
        info!(kind = %self.kind, queue, "task worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                popped = self.backend.pop_blocking(queue, self.poll_timeout) => {
                    match popped {
                        Ok(Some(payload)) => self.process_payload(&payload).await,
                        Ok(None) => {} // timeout; loop back around to the cancel check
                        Err(e) => {
                            warn!(kind = %self.kind, error = %e, "queue pop failed");
                            tokio::time::sleep(self.poll_timeout).await;
                        }
                    }
                }
            }
        }

        info!(kind = %self.kind, "task worker stopped");
    }

    async fn process_payload(&self, payload: &str) {
        let mut task: Task = match serde_json::from_str(payload) {
            Ok(task) => task,
            Err(e) => {
                warn!(kind = %self.kind, error = %e, "discarding malformed task payload");
                return;
            }
        };

        debug!(task_id = %task.id, image_code = %task.image_code, "processing task");
        task.status = TaskStatus::Processing;
        self.put_status(&task).await;

        match self.execute(&task).await {
            Ok(()) => self.complete(task).await,
            Err(e) => self.fail(task, e.to_string()).await,
        }
    }

    /// The kind's side effect. File absence is already-clean, not an error,
    /// so re-running a partially completed task converges.
    async fn execute(&self, task: &Task) -> Result<(), SnapbinError> {
        remove_file_if_present(&task.file_path).await?;

        match task.kind {
            TaskKind::Delete => {
                // A missing row means an earlier attempt (or a concurrent
                // delete) already removed it.
                images::delete(&self.db, task.image_id).await?;
            }
            TaskKind::Expire => {
                // CAS guard: only an active row transitions. A row already
                // expired or deleted counts as done.
                images::mark_expired(&self.db, task.image_id).await?;
            }
        }
        Ok(())
    }

    async fn complete(&self, mut task: Task) {
        task.status = TaskStatus::Completed;
        let message = match task.kind {
            TaskKind::Delete => "image deleted successfully",
            TaskKind::Expire => "image expired successfully",
        };
        self.publish_result(task.kind, TaskResult::success(&task.id, message))
            .await;
        self.put_status(&task).await;
        info!(task_id = %task.id, kind = %task.kind, "task completed");
    }

    async fn fail(&self, mut task: Task, message: String) {
        task.retry_count += 1;

        if task.retry_count >= MAX_RETRIES {
            task.status = TaskStatus::Failed;
            self.publish_result(task.kind, TaskResult::failure(&task.id, &message))
                .await;
            warn!(
                task_id = %task.id,
                retry_count = task.retry_count,
                error = %message,
                "task failed terminally"
            );
        } else {
            // Same id, bumped retry_count, back to the tail of its queue.
            // No delay between attempts.
            task.status = TaskStatus::Pending;
            match serde_json::to_string(&task) {
                Ok(payload) => {
                    if let Err(e) = self.backend.push(keys::queue_key(task.kind), &payload).await {
                        warn!(task_id = %task.id, error = %e, "re-enqueue failed; task dropped");
                    } else {
                        debug!(
                            task_id = %task.id,
                            retry_count = task.retry_count,
                            error = %message,
                            "task attempt failed, re-queued"
                        );
                    }
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "task re-serialization failed");
                }
            }
        }

        self.put_status(&task).await;
    }

    async fn put_status(&self, task: &Task) {
        let payload = match serde_json::to_string(task) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "status serialization failed");
                return;
            }
        };
        if let Err(e) = self
            .backend
            .put_status(&keys::status_key(&task.id), &payload, self.status_ttl)
            .await
        {
            warn!(task_id = %task.id, error = %e, "status write failed");
        }
    }

    async fn publish_result(&self, kind: TaskKind, result: TaskResult) {
        let payload = match serde_json::to_string(&result) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(task_id = %result.task_id, error = %e, "result serialization failed");
                return;
            }
        };
        if let Err(e) = self.backend.publish(keys::channel_key(kind), &payload).await {
            warn!(task_id = %result.task_id, error = %e, "result publish failed");
        }
    }
}

/// Remove `path`, treating an already-absent file as success.
async fn remove_file_if_present(path: &str) -> Result<(), SnapbinError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SnapbinError::Io(e)),
    }
}
