// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account operations.

use rusqlite::{params, OptionalExtension, Row};
use snapbin_core::SnapbinError;

use crate::database::{map_tr_err, Database};
use crate::models::{User, UserStatus};

const USER_COLUMNS: &str =
    "id, username, password_hash, email, status, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        status: super::parse_enum::<UserStatus>(4, row.get(4)?)?,
        created_at: super::parse_utc(5, row.get(5)?)?,
        updated_at: super::parse_utc(6, row.get(6)?)?,
    })
}

/// All users, oldest first.
pub async fn list(db: &Database) -> Result<Vec<User>, SnapbinError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))?;
            let users = stmt
                .query_map([], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user by primary key.
pub async fn get(db: &Database, id: i64) -> Result<Option<User>, SnapbinError> {
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    params![id],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user by username (login path).
pub async fn find_by_username(db: &Database, username: &str) -> Result<Option<User>, SnapbinError> {
    let username = username.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                    params![username],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether `username` is already used by a user other than `exclude_id`.
pub async fn username_taken(
    db: &Database,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool, SnapbinError> {
    let username = username.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2",
                params![username, exclude_id.unwrap_or(-1)],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether `email` is already used by a user other than `exclude_id`.
pub async fn email_taken(
    db: &Database,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<bool, SnapbinError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
                params![email, exclude_id.unwrap_or(-1)],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new user and return the stored row.
pub async fn insert(
    db: &Database,
    username: &str,
    password_hash: &str,
    email: &str,
    status: UserStatus,
) -> Result<User, SnapbinError> {
    let username = username.to_string();
    let password_hash = password_hash.to_string();
    let email = email.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, email, status) VALUES (?1, ?2, ?3, ?4)",
                params![username, password_hash, email, status],
            )?;
            let id = conn.last_insert_rowid();
            let user = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Update username/email/status of an existing user. Returns the updated row,
/// or `None` when no such user exists.
pub async fn update(
    db: &Database,
    id: i64,
    username: &str,
    email: &str,
    status: UserStatus,
) -> Result<Option<User>, SnapbinError> {
    let username = username.to_string();
    let email = email.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET username = ?1, email = ?2, status = ?3,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?4",
                params![username, email, status, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let user = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )?;
            Ok(Some(user))
        })
        .await
        .map_err(map_tr_err)
}

/// Replace a user's password hash.
pub async fn set_password(db: &Database, id: i64, password_hash: &str) -> Result<(), SnapbinError> {
    let password_hash = password_hash.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![password_hash, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a user. Returns whether a row was removed.
pub async fn delete(db: &Database, id: i64) -> Result<bool, SnapbinError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
