// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin user CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snapbin_core::password::hash_password;
use snapbin_core::{User, UserStatus};
use snapbin_storage::queries::users;

use crate::response::{success_with_message, ApiError, ApiResponse};
use crate::server::AppState;

/// User representation returned to clients; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub status: UserStatus,
}

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(2..=20).contains(&len) {
        return Err(ApiError::bad_request(
            "username must be between 2 and 20 characters",
        ));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 6 {
        return Err(ApiError::bad_request(
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if !valid {
        return Err(ApiError::bad_request("invalid email address"));
    }
    Ok(())
}

/// Hash on a blocking thread; argon2id is deliberately slow.
pub(crate) async fn hash_on_blocking_thread(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<UserInfo>>>), ApiError> {
    let all = users::list(&state.db).await?;
    let infos = all.iter().map(UserInfo::from).collect();
    Ok(success_with_message("users retrieved successfully", infos))
}

/// GET /api/v1/users/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let user = users::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(success_with_message(
        "user retrieved successfully",
        UserInfo::from(&user),
    ))
}

/// POST /api/v1/users
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_email(&req.email)?;

    if users::username_taken(&state.db, &req.username, None).await? {
        return Err(ApiError::bad_request("username already exists"));
    }
    if users::email_taken(&state.db, &req.email, None).await? {
        return Err(ApiError::bad_request("email already exists"));
    }

    let hash = hash_on_blocking_thread(req.password).await?;
    let user = users::insert(
        &state.db,
        &req.username,
        &hash,
        &req.email,
        req.status.unwrap_or(UserStatus::Active),
    )
    .await?;

    Ok(success_with_message(
        "user created successfully",
        UserInfo::from(&user),
    ))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;

    if users::username_taken(&state.db, &req.username, Some(id)).await? {
        return Err(ApiError::bad_request("username already exists"));
    }
    if users::email_taken(&state.db, &req.email, Some(id)).await? {
        return Err(ApiError::bad_request("email already exists"));
    }

    let user = users::update(&state.db, id, &req.username, &req.email, req.status)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(success_with_message(
        "user updated successfully",
        UserInfo::from(&user),
    ))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    if !users::delete(&state.db, id).await? {
        return Err(ApiError::not_found("user not found"));
    }
    Ok(success_with_message("user deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_bounds() {
        assert!(validate_username("ab").is_ok());
        assert!(validate_username(&"x".repeat(20)).is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn create_request_status_defaults_to_none() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"username": "bob", "password": "secret1", "email": "bob@example.com"}"#,
        )
        .unwrap();
        assert!(req.status.is_none());
    }

    #[test]
    fn user_info_never_serializes_password_material() {
        let user = User {
            id: 1,
            username: "admin".into(),
            password_hash: "$argon2id$secret".into(),
            email: "admin@example.com".into(),
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&UserInfo::from(&user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
