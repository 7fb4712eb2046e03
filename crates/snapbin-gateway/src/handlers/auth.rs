// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login and profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use snapbin_core::password::verify_password;
use snapbin_core::UserStatus;
use snapbin_storage::queries::users;

use crate::auth::AuthUser;
use crate::handlers::users::{
    hash_on_blocking_thread, validate_email, validate_password, validate_username, UserInfo,
};
use crate::response::{success_with_message, ApiError, ApiResponse};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResponse>>), ApiError> {
    let user = users::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    // Argon2 verification is deliberately slow; keep it off the executor.
    let hash = user.password_hash.clone();
    let password = req.password;
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?;
    if !verified {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    if user.status != UserStatus::Active {
        return Err(ApiError::unauthorized("user account is disabled"));
    }

    let token = state.jwt.generate(user.id, &user.username)?;
    tracing::info!(user_id = user.id, username = %user.username, "user logged in");

    Ok(success_with_message(
        "login successful",
        LoginResponse {
            token,
            user: UserInfo::from(&user),
        },
    ))
}

/// GET /api/v1/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let user = users::get(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(success_with_message(
        "profile retrieved successfully",
        UserInfo::from(&user),
    ))
}

/// PUT /api/v1/auth/profile
///
/// Partial update: only the provided fields change.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let current = users::get(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let username = match req.username {
        Some(username) if username != current.username => {
            validate_username(&username)?;
            if users::username_taken(&state.db, &username, Some(auth.user_id)).await? {
                return Err(ApiError::bad_request("username already exists"));
            }
            username
        }
        _ => current.username.clone(),
    };

    let email = match req.email {
        Some(email) if email != current.email => {
            validate_email(&email)?;
            if users::email_taken(&state.db, &email, Some(auth.user_id)).await? {
                return Err(ApiError::bad_request("email already exists"));
            }
            email
        }
        _ => current.email.clone(),
    };

    let user = users::update(&state.db, auth.user_id, &username, &email, current.status)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if let Some(password) = req.password {
        validate_password(&password)?;
        let hash = hash_on_blocking_thread(password).await?;
        users::set_password(&state.db, auth.user_id, &hash).await?;
    }

    Ok(success_with_message(
        "profile updated successfully",
        UserInfo::from(&user),
    ))
}
