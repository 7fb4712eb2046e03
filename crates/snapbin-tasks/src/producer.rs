// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Enqueue-side of the task pipeline.
//!
//! Success here means the task is durably enqueued, not executed -- callers
//! observe the eventual outcome via [`TaskProducer::task_status`] or the
//! result channel.

use std::sync::Arc;
use std::time::Duration;

use snapbin_core::{SnapbinError, Task, TaskKind};
use tracing::info;

use crate::backend::TaskBackend;
use crate::keys;

/// Builds tasks and pushes them onto the per-kind queues.
#[derive(Clone)]
pub struct TaskProducer {
    backend: Arc<dyn TaskBackend>,
    status_ttl: Duration,
}

impl TaskProducer {
    pub fn new(backend: Arc<dyn TaskBackend>, status_ttl: Duration) -> Self {
        Self {
            backend,
            status_ttl,
        }
    }

    /// Enqueue removal of an image's file and row.
    pub async fn enqueue_delete(
        &self,
        image_id: i64,
        image_code: &str,
        file_path: &str,
    ) -> Result<Task, SnapbinError> {
        self.enqueue(Task::new(TaskKind::Delete, image_id, image_code, file_path))
            .await
    }

    /// Enqueue expiry of an image: file removed, row marked expired.
    pub async fn enqueue_expire(
        &self,
        image_id: i64,
        image_code: &str,
        file_path: &str,
    ) -> Result<Task, SnapbinError> {
        self.enqueue(Task::new(TaskKind::Expire, image_id, image_code, file_path))
            .await
    }

    /// Read a task's latest known state from the status store.
    ///
    /// `Ok(None)` covers unknown IDs and records whose TTL has lapsed; the
    /// operation's effect may be long done either way.
    pub async fn task_status(&self, task_id: &str) -> Result<Option<Task>, SnapbinError> {
        match self.backend.get_status(&keys::status_key(task_id)).await? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                SnapbinError::Internal(format!("corrupt status record for {task_id}: {e}"))
            }),
            None => Ok(None),
        }
    }

    async fn enqueue(&self, task: Task) -> Result<Task, SnapbinError> {
        let payload = serde_json::to_string(&task).map_err(|e| SnapbinError::Queue {
            message: format!("task serialization failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        self.backend
            .push(keys::queue_key(task.kind), &payload)
            .await?;
        // Written after the push so a status hit implies the task exists;
        // pollers must see `pending` immediately after enqueue.
        self.backend
            .put_status(&keys::status_key(&task.id), &payload, self.status_ttl)
            .await?;

        info!(task_id = %task.id, kind = %task.kind, image_id = task.image_id, "task enqueued");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use snapbin_core::TaskStatus;

    fn producer_with_backend() -> (TaskProducer, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let producer = TaskProducer::new(backend.clone(), Duration::from_secs(60));
        (producer, backend)
    }

    #[tokio::test]
    async fn enqueue_delete_pushes_to_the_delete_queue() {
        let (producer, backend) = producer_with_backend();
        let task = producer
            .enqueue_delete(42, "abc123", "/tmp/abc123.png")
            .await
            .unwrap();

        assert_eq!(backend.queue_len(keys::IMAGE_DELETE_QUEUE), 1);
        assert_eq!(backend.queue_len(keys::IMAGE_EXPIRE_QUEUE), 0);

        let payload = backend
            .pop_blocking(keys::IMAGE_DELETE_QUEUE, Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();
        let queued: Task = serde_json::from_str(&payload).unwrap();
        assert_eq!(queued.id, task.id);
        assert_eq!(queued.kind, TaskKind::Delete);
        assert_eq!(queued.retry_count, 0);
    }

    #[tokio::test]
    async fn status_is_pending_immediately_after_enqueue() {
        let (producer, _backend) = producer_with_backend();
        let task = producer
            .enqueue_expire(7, "deadbeef", "/tmp/deadbeef.gif")
            .await
            .unwrap();

        let status = producer.task_status(&task.id).await.unwrap().unwrap();
        assert_eq!(status.status, TaskStatus::Pending);
        assert_eq!(status.kind, TaskKind::Expire);
        assert_eq!(status.image_id, 7);
    }

    #[tokio::test]
    async fn unknown_task_id_reads_as_not_found() {
        let (producer, _backend) = producer_with_backend();
        assert!(producer.task_status("20260101000000-missing1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_record_expires_with_its_ttl() {
        let backend = Arc::new(MemoryBackend::new());
        let producer = TaskProducer::new(backend.clone(), Duration::from_millis(40));
        let task = producer
            .enqueue_delete(1, "c0ffee00", "/tmp/c0ffee00.jpg")
            .await
            .unwrap();

        assert!(producer.task_status(&task.id).await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(producer.task_status(&task.id).await.unwrap().is_none());
    }
}
