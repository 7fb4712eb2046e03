// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task records for the asynchronous delete/expire pipeline.
//!
//! The JSON field names here are a wire format shared with existing queue
//! deployments and must not change: `id`, `type`, `image_id`, `image_code`,
//! `file_path`, `created_at`, `retry_count`, `status`.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Maximum number of failed attempts before a task is marked terminally failed.
pub const MAX_RETRIES: u32 = 3;

/// Which side effect a task performs, and therefore which queue carries it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Remove the stored file and delete the image row.
    Delete,
    /// Remove the stored file and mark the image row expired (row retained).
    Expire,
}

/// Position of a task in its lifecycle state machine.
///
/// `pending -> processing -> {completed | failed}`, with failed attempts
/// below the retry cap cycling back to `pending`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One pending or in-flight side-effecting operation.
///
/// Immutable at creation apart from `retry_count` and `status`, which the
/// worker advances. The `id` never changes across re-enqueues, so status
/// lookups stay valid across retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub image_id: i64,
    pub image_code: String,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    pub status: TaskStatus,
}

impl Task {
    /// Build a fresh task in `pending` state with `retry_count = 0`.
    pub fn new(
        kind: TaskKind,
        image_id: i64,
        image_code: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_task_id(Utc::now()),
            kind,
            image_id,
            image_code: image_code.into(),
            file_path: file_path.into(),
            created_at: Utc::now(),
            retry_count: 0,
            status: TaskStatus::Pending,
        }
    }
}

/// Terminal outcome record, published once a task reaches completed or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub success: bool,
    pub message: String,
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn success(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            message: message.into(),
            completed_at: Utc::now(),
        }
    }

    pub fn failure(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            message: message.into(),
            completed_at: Utc::now(),
        }
    }
}

/// Task IDs sort by creation time: a UTC second-resolution prefix plus a
/// random 8-char alphanumeric suffix for uniqueness within the same second.
fn generate_task_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}
