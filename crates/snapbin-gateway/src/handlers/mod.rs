// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod images;
pub mod users;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::response::{success_with_message, ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
}

/// GET /api/v1/health
pub async fn health() -> (StatusCode, Json<ApiResponse<HealthData>>) {
    success_with_message(
        "snapbin API v1 is running",
        HealthData {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
}
