// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared error and domain types for the snapbin image host.
//!
//! The canonical types (tasks, images, users) live here so the storage,
//! task-pipeline, and gateway crates agree on one definition across their
//! boundaries.

pub mod error;
pub mod password;
pub mod task;
pub mod types;

pub use error::SnapbinError;
pub use task::{Task, TaskKind, TaskResult, TaskStatus, MAX_RETRIES};
pub use types::{Image, ImageStatus, User, UserStatus};
