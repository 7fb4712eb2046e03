// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `{code, message, data}` response envelope and its error half.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snapbin_core::SnapbinError;

/// Every JSON response, success or failure, uses this envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 200 with data and a generic message.
pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    success_with_message("success", data)
}

/// 200 with data and an explicit message.
pub fn success_with_message<T: Serialize>(
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        }),
    )
}

/// An error rendered through the envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            code: self.status.as_u16(),
            message: self.message,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SnapbinError> for ApiError {
    fn from(err: SnapbinError) -> Self {
        match err {
            SnapbinError::NotFound(message) => ApiError::not_found(message),
            SnapbinError::Validation(message) => ApiError::bad_request(message),
            SnapbinError::Auth(message) => ApiError::unauthorized(message),
            other => {
                tracing::error!(error = %other, "request failed");
                ApiError::internal("internal server error")
            }
        }
    }
}
