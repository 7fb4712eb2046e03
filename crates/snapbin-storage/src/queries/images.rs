// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosted image operations, including the status transitions driven by the
//! task workers and the expiry scanner.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use snapbin_core::SnapbinError;

use crate::database::{map_tr_err, Database};
use crate::models::{Image, ImageStatus};

const IMAGE_COLUMNS: &str = "id, image_code, file_name, file_path, file_size, file_type,
     upload_time, expire_time, status, created_at, updated_at";

/// Fields supplied by the upload path; everything else is generated.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub image_code: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub expire_time: DateTime<Utc>,
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<Image> {
    Ok(Image {
        id: row.get(0)?,
        image_code: row.get(1)?,
        file_name: row.get(2)?,
        file_path: row.get(3)?,
        file_size: row.get(4)?,
        file_type: row.get(5)?,
        upload_time: super::parse_utc(6, row.get(6)?)?,
        expire_time: super::parse_utc(7, row.get(7)?)?,
        status: super::parse_enum::<ImageStatus>(8, row.get(8)?)?,
        created_at: super::parse_utc(9, row.get(9)?)?,
        updated_at: super::parse_utc(10, row.get(10)?)?,
    })
}

/// Insert a new active image row and return it.
pub async fn insert(db: &Database, new: NewImage) -> Result<Image, SnapbinError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO images (image_code, file_name, file_path, file_size, file_type, expire_time, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active')",
                params![
                    new.image_code,
                    new.file_name,
                    new.file_path,
                    new.file_size,
                    new.file_type,
                    super::format_utc(new.expire_time),
                ],
            )?;
            let id = conn.last_insert_rowid();
            let image = conn.query_row(
                &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
                params![id],
                image_from_row,
            )?;
            Ok(image)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up an image by primary key.
pub async fn get(db: &Database, id: i64) -> Result<Option<Image>, SnapbinError> {
    db.connection()
        .call(move |conn| {
            let image = conn
                .query_row(
                    &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"),
                    params![id],
                    image_from_row,
                )
                .optional()?;
            Ok(image)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up an image by its public code.
pub async fn get_by_code(db: &Database, image_code: &str) -> Result<Option<Image>, SnapbinError> {
    let image_code = image_code.to_string();
    db.connection()
        .call(move |conn| {
            let image = conn
                .query_row(
                    &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE image_code = ?1"),
                    params![image_code],
                    image_from_row,
                )
                .optional()?;
            Ok(image)
        })
        .await
        .map_err(map_tr_err)
}

/// Newest-first page of images plus the total row count.
pub async fn list(
    db: &Database,
    page: u32,
    page_size: u32,
) -> Result<(i64, Vec<Image>), SnapbinError> {
    let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
    let limit = i64::from(page_size);
    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {IMAGE_COLUMNS} FROM images ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let items = stmt
                .query_map(params![limit, offset], image_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok((total, items))
        })
        .await
        .map_err(map_tr_err)
}

/// A uniformly random active, unexpired image, if any.
pub async fn random_active(db: &Database, now: DateTime<Utc>) -> Result<Option<Image>, SnapbinError> {
    let now = super::format_utc(now);
    db.connection()
        .call(move |conn| {
            let image = conn
                .query_row(
                    &format!(
                        "SELECT {IMAGE_COLUMNS} FROM images
                         WHERE status = 'active' AND expire_time > ?1
                         ORDER BY RANDOM() LIMIT 1"
                    ),
                    params![now],
                    image_from_row,
                )
                .optional()?;
            Ok(image)
        })
        .await
        .map_err(map_tr_err)
}

/// Active images whose expiry timestamp has passed, oldest expiry first.
pub async fn list_expired(db: &Database, now: DateTime<Utc>) -> Result<Vec<Image>, SnapbinError> {
    let now = super::format_utc(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IMAGE_COLUMNS} FROM images
                 WHERE status = 'active' AND expire_time < ?1
                 ORDER BY expire_time ASC"
            ))?;
            let items = stmt
                .query_map(params![now], image_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an image row. Returns whether a row was removed; deleting an
/// already-deleted row is not an error (the delete worker may retry).
pub async fn delete(db: &Database, id: i64) -> Result<bool, SnapbinError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM images WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-swap transition `active -> expired`.
///
/// Returns whether the row was transitioned by this call. A row already past
/// `active` (or deleted) leaves the guard unmatched, which callers treat as
/// already-done rather than failure.
pub async fn mark_expired(db: &Database, id: i64) -> Result<bool, SnapbinError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE images SET status = 'expired',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'active'",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn sample(code: &str, expires_in: Duration) -> NewImage {
        NewImage {
            image_code: code.to_string(),
            file_name: format!("{code}.png"),
            file_path: format!("/tmp/{code}.png"),
            file_size: 1024,
            file_type: "png".to_string(),
            expire_time: Utc::now() + expires_in,
        }
    }

    #[tokio::test]
    async fn insert_and_lookup_by_id_and_code() {
        let (db, _dir) = setup_db().await;
        let created = insert(&db, sample("abc123", Duration::hours(1))).await.unwrap();
        assert_eq!(created.status, ImageStatus::Active);

        let by_id = get(&db, created.id).await.unwrap().unwrap();
        assert_eq!(by_id.image_code, "abc123");

        let by_code = get_by_code(&db, "abc123").await.unwrap().unwrap();
        assert_eq!(by_code.id, created.id);

        assert!(get_by_code(&db, "missing").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (db, _dir) = setup_db().await;
        for i in 0..5 {
            insert(&db, sample(&format!("code{i}"), Duration::hours(1)))
                .await
                .unwrap();
        }

        let (total, first_page) = list(&db, 1, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].image_code, "code4");

        let (_, last_page) = list(&db, 3, 2).await.unwrap();
        assert_eq!(last_page.len(), 1);
        assert_eq!(last_page[0].image_code, "code0");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_expired_only_returns_lapsed_active_rows() {
        let (db, _dir) = setup_db().await;
        let lapsed = insert(&db, sample("old", Duration::hours(-2))).await.unwrap();
        insert(&db, sample("fresh", Duration::hours(2))).await.unwrap();
        let already_expired = insert(&db, sample("done", Duration::hours(-5))).await.unwrap();
        mark_expired(&db, already_expired.id).await.unwrap();

        let expired = list_expired(&db, Utc::now()).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, lapsed.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_expired_is_a_one_shot_cas() {
        let (db, _dir) = setup_db().await;
        let image = insert(&db, sample("cas", Duration::hours(-1))).await.unwrap();

        assert!(mark_expired(&db, image.id).await.unwrap());
        // Second transition finds no active row to swap.
        assert!(!mark_expired(&db, image.id).await.unwrap());

        let stored = get(&db, image.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ImageStatus::Expired);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn random_active_skips_expired_and_inactive() {
        let (db, _dir) = setup_db().await;
        assert!(random_active(&db, Utc::now()).await.unwrap().is_none());

        insert(&db, sample("lapsed", Duration::hours(-1))).await.unwrap();
        let valid = insert(&db, sample("valid", Duration::hours(1))).await.unwrap();

        let picked = random_active(&db, Utc::now()).await.unwrap().unwrap();
        assert_eq!(picked.id, valid.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let image = insert(&db, sample("gone", Duration::hours(1))).await.unwrap();
        assert!(delete(&db, image.id).await.unwrap());
        assert!(!delete(&db, image.id).await.unwrap());
        db.close().await.unwrap();
    }
}
