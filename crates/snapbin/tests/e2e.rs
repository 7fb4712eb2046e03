// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline tests: storage, producer, workers, and scanner wired
//! together the way `snapbin serve` wires them, minus the HTTP listener.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use snapbin_core::{ImageStatus, TaskKind, TaskStatus};
use snapbin_storage::queries::images::{self, NewImage};
use snapbin_storage::Database;
use snapbin_tasks::{ExpiryScanner, MemoryBackend, TaskProducer, TaskWorker};
use tokio_util::sync::CancellationToken;

const STATUS_TTL: Duration = Duration::from_secs(60);
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

struct Stack {
    db: Arc<Database>,
    backend: Arc<MemoryBackend>,
    producer: TaskProducer,
    scanner: ExpiryScanner,
    cancel: CancellationToken,
    workers: Vec<tokio::task::JoinHandle<()>>,
    dir: tempfile::TempDir,
}

/// Boot the full pipeline on a scratch database and in-memory backend,
/// with both worker kinds running.
async fn boot() -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("snapbin.db");
    let db = Arc::new(Database::open(db_path.to_str().unwrap()).await.unwrap());
    let backend = Arc::new(MemoryBackend::new());
    let producer = TaskProducer::new(backend.clone(), STATUS_TTL);
    let scanner = ExpiryScanner::new(db.clone(), producer.clone(), Duration::from_secs(3600));

    let cancel = CancellationToken::new();
    let workers = [TaskKind::Delete, TaskKind::Expire]
        .into_iter()
        .map(|kind| {
            let worker = TaskWorker::new(
                kind,
                backend.clone() as Arc<dyn snapbin_tasks::TaskBackend>,
                db.clone(),
                POLL_TIMEOUT,
                STATUS_TTL,
            );
            tokio::spawn(worker.run(cancel.clone()))
        })
        .collect();

    Stack {
        db,
        backend,
        producer,
        scanner,
        cancel,
        workers,
        dir,
    }
}

impl Stack {
    async fn insert_image(&self, code: &str, expires_in: chrono::Duration) -> (i64, std::path::PathBuf) {
        let path = self.dir.path().join(format!("{code}.png"));
        std::fs::write(&path, b"png bytes").unwrap();
        let image = images::insert(
            &self.db,
            NewImage {
                image_code: code.to_string(),
                file_name: format!("{code}.png"),
                file_path: path.to_string_lossy().into_owned(),
                file_size: 9,
                file_type: "png".to_string(),
                expire_time: Utc::now() + expires_in,
            },
        )
        .await
        .unwrap();
        (image.id, path)
    }

    async fn wait_for_status(&self, task_id: &str, target: TaskStatus) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(task) = self.producer.task_status(task_id).await.unwrap()
                    && task.status == target
                {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for task {task_id} to reach {target}"));
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.workers {
            tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .expect("worker did not stop")
                .unwrap();
        }
    }
}

#[tokio::test]
async fn explicit_delete_flows_through_queue_to_row_and_file() {
    let stack = boot().await;
    let (image_id, path) = stack.insert_image("delete01", chrono::Duration::hours(1)).await;

    let task = stack
        .producer
        .enqueue_delete(image_id, "delete01", path.to_str().unwrap())
        .await
        .unwrap();

    stack.wait_for_status(&task.id, TaskStatus::Completed).await;
    assert!(!path.exists());
    assert!(images::get(&stack.db, image_id).await.unwrap().is_none());

    stack.shutdown().await;
}

#[tokio::test]
async fn scanner_drives_lapsed_images_through_the_expire_worker() {
    let stack = boot().await;
    let (lapsed_id, lapsed_path) = stack.insert_image("lapsed01", chrono::Duration::hours(-1)).await;
    let (fresh_id, fresh_path) = stack.insert_image("fresh001", chrono::Duration::hours(1)).await;

    let enqueued = stack.scanner.scan_once().await.unwrap();
    assert_eq!(enqueued, 1);

    // The expire worker removes the file and marks the row, keeping it.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let row = images::get(&stack.db, lapsed_id).await.unwrap().unwrap();
            if row.status == ImageStatus::Expired {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("lapsed image never expired");
    assert!(!lapsed_path.exists());

    // The fresh image is untouched.
    let fresh = images::get(&stack.db, fresh_id).await.unwrap().unwrap();
    assert_eq!(fresh.status, ImageStatus::Active);
    assert!(fresh_path.exists());

    // A second scan finds nothing left to enqueue.
    assert_eq!(stack.scanner.scan_once().await.unwrap(), 0);

    stack.shutdown().await;
}

#[tokio::test]
async fn delete_and_expire_pipelines_run_independently() {
    let stack = boot().await;
    let (delete_id, delete_path) = stack.insert_image("todelete", chrono::Duration::hours(1)).await;
    let (expire_id, expire_path) = stack.insert_image("toexpire", chrono::Duration::hours(1)).await;

    let delete_task = stack
        .producer
        .enqueue_delete(delete_id, "todelete", delete_path.to_str().unwrap())
        .await
        .unwrap();
    let expire_task = stack
        .producer
        .enqueue_expire(expire_id, "toexpire", expire_path.to_str().unwrap())
        .await
        .unwrap();

    stack.wait_for_status(&delete_task.id, TaskStatus::Completed).await;
    stack.wait_for_status(&expire_task.id, TaskStatus::Completed).await;

    assert!(images::get(&stack.db, delete_id).await.unwrap().is_none());
    let expired = images::get(&stack.db, expire_id).await.unwrap().unwrap();
    assert_eq!(expired.status, ImageStatus::Expired);

    stack.shutdown().await;
}

#[tokio::test]
async fn queues_are_empty_after_successful_processing() {
    let stack = boot().await;
    let (image_id, path) = stack.insert_image("cleanup1", chrono::Duration::hours(1)).await;

    let task = stack
        .producer
        .enqueue_delete(image_id, "cleanup1", path.to_str().unwrap())
        .await
        .unwrap();
    stack.wait_for_status(&task.id, TaskStatus::Completed).await;

    assert_eq!(stack.backend.queue_len(snapbin_tasks::keys::IMAGE_DELETE_QUEUE), 0);
    assert_eq!(stack.backend.queue_len(snapbin_tasks::keys::IMAGE_EXPIRE_QUEUE), 0);

    stack.shutdown().await;
}
