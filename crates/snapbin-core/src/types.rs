// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical domain types shared across storage, task pipeline, and gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a hosted image row.
///
/// `Expired` rows are retained (the file is gone, the record stays);
/// `Deleted` exists only transiently since deletion removes the row itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Active,
    Expired,
    Deleted,
}

/// Account state of an admin user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// A hosted image row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    /// Short unique code used in public URLs.
    pub image_code: String,
    /// Original filename as uploaded.
    pub file_name: String,
    /// Path of the stored file on disk.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Lowercase extension without the dot (jpg, png, ...).
    pub file_type: String,
    pub upload_time: DateTime<Utc>,
    pub expire_time: DateTime<Utc>,
    pub status: ImageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    /// Whether the image's expiry timestamp has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_time <= now
    }

    /// Milliseconds until expiry at `now`, floored at zero.
    pub fn remaining_millis(&self, now: DateTime<Utc>) -> i64 {
        (self.expire_time - now).num_milliseconds().max(0)
    }
}

/// An admin user row. The password hash never leaves the storage/auth layers.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn image_status_round_trips_as_lowercase() {
        assert_eq!(ImageStatus::Active.to_string(), "active");
        assert_eq!("expired".parse::<ImageStatus>().unwrap(), ImageStatus::Expired);
        let json = serde_json::to_string(&ImageStatus::Deleted).unwrap();
        assert_eq!(json, "\"deleted\"");
    }

    #[test]
    fn remaining_millis_floors_at_zero() {
        let now = Utc::now();
        let image = Image {
            id: 1,
            image_code: "abc123".into(),
            file_name: "cat.png".into(),
            file_path: "/tmp/abc123.png".into(),
            file_size: 42,
            file_type: "png".into(),
            upload_time: now,
            expire_time: now - Duration::minutes(5),
            status: ImageStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(image.is_expired_at(now));
        assert_eq!(image.remaining_millis(now), 0);
    }

    #[test]
    fn remaining_millis_positive_before_expiry() {
        let now = Utc::now();
        let image = Image {
            id: 1,
            image_code: "abc123".into(),
            file_name: "cat.png".into(),
            file_path: "/tmp/abc123.png".into(),
            file_size: 42,
            file_type: "png".into(),
            upload_time: now,
            expire_time: now + Duration::minutes(1),
            status: ImageStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert!(!image.is_expired_at(now));
        assert_eq!(image.remaining_millis(now), 60_000);
    }
}
