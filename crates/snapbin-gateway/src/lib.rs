// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API gateway for the snapbin image host.
//!
//! Serves the admin API (JWT-authenticated user CRUD and image management)
//! and the public image endpoints. Deletion requests return as soon as the
//! task is durably enqueued; the outcome is observed via the task-status
//! endpoint.

pub mod auth;
pub mod handlers;
pub mod response;
pub mod server;

pub use auth::JwtManager;
pub use server::{router, start_server, AppState, GatewaySettings};
