// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image upload, retrieval, serving, and deletion handlers.
//!
//! Deletion is asynchronous: the handler returns once a delete task is
//! durably enqueued, handing back the task id for status polling.

use std::path::Path as FsPath;

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snapbin_core::{Image, ImageStatus, Task};
use snapbin_storage::queries::images;
use snapbin_storage::queries::images::NewImage;
use uuid::Uuid;

use crate::response::{success_with_message, ApiError, ApiResponse};
use crate::server::AppState;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
/// Expiry is capped at one year regardless of unit.
const MAX_EXPIRE_MINUTES: u32 = 60 * 24 * 365;
const MAX_EXPIRE_HOURS: u32 = 24 * 365;
const MAX_EXPIRE_DAYS: u32 = 365;

/// Image representation returned to clients, with derived expiry fields.
#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub id: i64,
    pub image_code: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub upload_time: DateTime<Utc>,
    pub expire_time: DateTime<Utc>,
    pub status: ImageStatus,
    /// Milliseconds until expiry, floored at zero.
    pub remaining_time: i64,
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Image> for ImageInfo {
    fn from(image: &Image) -> Self {
        let now = Utc::now();
        Self {
            id: image.id,
            image_code: image.image_code.clone(),
            file_name: image.file_name.clone(),
            file_path: image.file_path.clone(),
            file_size: image.file_size,
            file_type: image.file_type.clone(),
            upload_time: image.upload_time,
            expire_time: image.expire_time,
            status: image.status,
            remaining_time: image.remaining_millis(now),
            is_expired: image.is_expired_at(now),
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageListData {
    pub total: i64,
    pub items: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RandomImageData {
    #[serde(flatten)]
    pub image: ImageInfo,
    /// Suggested client-side access deadline for this pick.
    pub access_expire_time: DateTime<Utc>,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteScheduledData {
    pub task_id: String,
}

/// POST /api/v1/images/upload (multipart: image, expire_value, expire_unit)
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ImageInfo>>), ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut expire_value: Option<u32> = None;
    let mut expire_unit: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                file = Some((file_name, bytes));
            }
            "expire_value" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid expire_value: {e}")))?;
                expire_value = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| ApiError::bad_request("expire_value must be a positive integer"))?,
                );
            }
            "expire_unit" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid expire_unit: {e}")))?;
                expire_unit = Some(text.trim().to_string());
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::bad_request("an image file is required"))?;
    let expire_value = expire_value.ok_or_else(|| ApiError::bad_request("expire_value is required"))?;
    let expire_unit = expire_unit.ok_or_else(|| ApiError::bad_request("expire_unit is required"))?;

    if expire_value < 1 {
        return Err(ApiError::bad_request("expire_value must be at least 1"));
    }
    let expire_time = expiry_from(expire_value, &expire_unit)?;

    let extension = FsPath::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::bad_request(
            "invalid image type, only jpg, jpeg, png, gif are supported",
        ));
    }

    if bytes.len() as u64 > state.settings.max_file_size_bytes {
        return Err(ApiError::bad_request(format!(
            "file too large, maximum is {} bytes",
            state.settings.max_file_size_bytes
        )));
    }

    let image_code = generate_image_code();
    let stored_name = format!("{image_code}.{extension}");
    let dir = FsPath::new(&state.settings.upload_dir);
    let stored_path = dir.join(&stored_name);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::internal(format!("failed to create upload directory: {e}")))?;
    tokio::fs::write(&stored_path, &bytes)
        .await
        .map_err(|e| ApiError::internal(format!("failed to store upload: {e}")))?;

    let new_image = NewImage {
        image_code: image_code.clone(),
        file_name,
        file_path: stored_path.to_string_lossy().into_owned(),
        file_size: bytes.len() as i64,
        file_type: extension,
        expire_time,
    };

    let image = match images::insert(&state.db, new_image).await {
        Ok(image) => image,
        Err(e) => {
            // Do not leave an orphaned file behind a failed insert.
            let _ = tokio::fs::remove_file(&stored_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(image_id = image.id, image_code = %image.image_code, "image uploaded");
    Ok(success_with_message(
        "image uploaded successfully",
        ImageInfo::from(&image),
    ))
}

/// GET /api/v1/images?page=&page_size=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<(StatusCode, Json<ApiResponse<ImageListData>>), ApiError> {
    let page = params.page.filter(|&p| p >= 1).unwrap_or(1);
    let page_size = params
        .page_size
        .filter(|&s| (1..=100).contains(&s))
        .unwrap_or(10);

    let (total, items) = images::list(&state.db, page, page_size).await?;
    Ok(success_with_message(
        "images retrieved successfully",
        ImageListData {
            total,
            items: items.iter().map(ImageInfo::from).collect(),
        },
    ))
}

/// GET /api/v1/images/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<ImageInfo>>), ApiError> {
    let image = images::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("image not found"))?;
    Ok(success_with_message(
        "image retrieved successfully",
        ImageInfo::from(&image),
    ))
}

/// GET /api/v1/images/code/{code}
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<ImageInfo>>), ApiError> {
    let image = images::get_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| ApiError::not_found("image not found"))?;
    Ok(success_with_message(
        "image retrieved successfully",
        ImageInfo::from(&image),
    ))
}

/// GET /api/v1/images/file/{code} -- the raw bytes, while the image is live.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let image = images::get_by_code(&state.db, &code)
        .await?
        .ok_or_else(|| ApiError::not_found("image not found"))?;

    if image.status != ImageStatus::Active || image.is_expired_at(Utc::now()) {
        return Err(ApiError::bad_request("image has expired"));
    }

    let bytes = match tokio::fs::read(&image.file_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("image file not found"));
        }
        Err(e) => return Err(ApiError::internal(format!("failed to read image file: {e}"))),
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_for(&image.file_type))],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/images/random -- a random live image plus its access URL.
pub async fn random(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<RandomImageData>>), ApiError> {
    let image = images::random_active(&state.db, Utc::now())
        .await?
        .ok_or_else(|| ApiError::not_found("no images available"))?;

    let image_url = format!("/api/v1/images/file/{}", image.image_code);
    Ok(success_with_message(
        "random image retrieved successfully",
        RandomImageData {
            image: ImageInfo::from(&image),
            access_expire_time: Utc::now() + Duration::minutes(5),
            image_url,
        },
    ))
}

/// DELETE /api/v1/images/{id} -- enqueue asynchronous deletion.
///
/// Success means the task is durably enqueued, not that the image is gone;
/// poll `/api/v1/images/task/{task_id}` for the outcome.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<DeleteScheduledData>>), ApiError> {
    let image = images::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("image not found"))?;

    let task = state
        .producer
        .enqueue_delete(image.id, &image.image_code, &image.file_path)
        .await?;

    Ok(success_with_message(
        "image deletion scheduled",
        DeleteScheduledData { task_id: task.id },
    ))
}

/// GET /api/v1/images/task/{task_id} -- poll a task's latest known state.
pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), ApiError> {
    let task = state
        .producer
        .task_status(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("task not found"))?;
    Ok(success_with_message("task status retrieved", task))
}

fn expiry_from(value: u32, unit: &str) -> Result<DateTime<Utc>, ApiError> {
    let now = Utc::now();
    match unit {
        "minutes" if value <= MAX_EXPIRE_MINUTES => Ok(now + Duration::minutes(i64::from(value))),
        "hours" if value <= MAX_EXPIRE_HOURS => Ok(now + Duration::hours(i64::from(value))),
        "days" if value <= MAX_EXPIRE_DAYS => Ok(now + Duration::days(i64::from(value))),
        "minutes" | "hours" | "days" => {
            Err(ApiError::bad_request("expiry must not exceed one year"))
        }
        _ => Err(ApiError::bad_request(
            "invalid expire_unit, supported: minutes, hours, days",
        )),
    }
}

fn content_type_for(file_type: &str) -> &'static str {
    match file_type {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// 8-char code used in public URLs; collision space is plenty for this scale.
fn generate_image_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_units_and_caps() {
        assert!(expiry_from(30, "minutes").is_ok());
        assert!(expiry_from(24, "hours").is_ok());
        assert!(expiry_from(7, "days").is_ok());

        assert!(expiry_from(MAX_EXPIRE_MINUTES + 1, "minutes").is_err());
        assert!(expiry_from(MAX_EXPIRE_HOURS + 1, "hours").is_err());
        assert!(expiry_from(MAX_EXPIRE_DAYS + 1, "days").is_err());
        assert!(expiry_from(1, "weeks").is_err());
    }

    #[test]
    fn content_types_cover_the_whitelist() {
        assert_eq!(content_type_for("jpg"), "image/jpeg");
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("gif"), "image/gif");
        assert_eq!(content_type_for("bmp"), "application/octet-stream");
    }

    #[test]
    fn image_codes_are_short_and_unique_enough() {
        let a = generate_image_code();
        let b = generate_image_code();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn random_image_payload_flattens_image_fields() {
        let now = Utc::now();
        let image = Image {
            id: 5,
            image_code: "cafe0123".into(),
            file_name: "cat.png".into(),
            file_path: "/tmp/cafe0123.png".into(),
            file_size: 10,
            file_type: "png".into(),
            upload_time: now,
            expire_time: now + Duration::hours(1),
            status: ImageStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let data = RandomImageData {
            image: ImageInfo::from(&image),
            access_expire_time: now + Duration::minutes(5),
            image_url: "/api/v1/images/file/cafe0123".into(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["image_code"], "cafe0123");
        assert_eq!(json["image_url"], "/api/v1/images/file/cafe0123");
        assert!(json["access_expire_time"].is_string());
    }
}
