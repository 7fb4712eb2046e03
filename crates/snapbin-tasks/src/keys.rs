// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue, channel, and status-store key constants.
//!
//! These strings are shared with existing deployments and must match exactly.

use snapbin_core::TaskKind;

/// FIFO queue carrying delete tasks.
pub const IMAGE_DELETE_QUEUE: &str = "image:delete:queue";
/// FIFO queue carrying expire tasks.
pub const IMAGE_EXPIRE_QUEUE: &str = "image:expire:queue";
/// Result channel for delete task outcomes.
pub const IMAGE_DELETE_CHANNEL: &str = "image:delete:channel";
/// Result channel for expire task outcomes.
pub const IMAGE_EXPIRE_CHANNEL: &str = "image:expire:channel";
/// Prefix of per-task status records.
pub const TASK_STATUS_PREFIX: &str = "task:status:";

/// The queue a task kind is carried on.
pub fn queue_key(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Delete => IMAGE_DELETE_QUEUE,
        TaskKind::Expire => IMAGE_EXPIRE_QUEUE,
    }
}

/// The channel a task kind's terminal results are published on.
pub fn channel_key(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Delete => IMAGE_DELETE_CHANNEL,
        TaskKind::Expire => IMAGE_EXPIRE_CHANNEL,
    }
}

/// The status-store key for a task ID.
pub fn status_key(task_id: &str) -> String {
    format!("{TASK_STATUS_PREFIX}{task_id}")
}
