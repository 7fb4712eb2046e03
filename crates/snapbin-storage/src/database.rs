// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Migrations and default-user seeding run on a short-lived blocking
//! connection before the async handle opens, so the async side never sees a
//! half-initialized schema.

use snapbin_core::password::hash_password;
use snapbin_core::SnapbinError;
use tracing::{debug, info};

/// Async handle to the snapbin SQLite database.
///
/// Wraps a single `tokio_rusqlite::Connection`; query modules accept
/// `&Database` and go through [`Database::connection`]. Do NOT create
/// additional connections for writes.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`.
    ///
    /// Applies PRAGMAs, runs pending migrations, and seeds the default
    /// admin/user accounts when the users table is empty.
    pub async fn open(path: &str) -> Result<Self, SnapbinError> {
        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || setup_blocking(&setup_path))
            .await
            .map_err(|e| SnapbinError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| SnapbinError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), SnapbinError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn
            .close()
            .await
            .map_err(|e| SnapbinError::Storage {
                source: Box::new(e),
            })?;
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the crate error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> SnapbinError {
    SnapbinError::Storage {
        source: Box::new(e),
    }
}

/// Blocking one-shot setup: PRAGMAs, migrations, default users.
fn setup_blocking(path: &str) -> Result<(), SnapbinError> {
    if let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = rusqlite::Connection::open(path).map_err(|e| SnapbinError::Storage {
        source: Box::new(e),
    })?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| SnapbinError::Storage {
            source: Box::new(e),
        })?;

    crate::migrations::run_migrations(&mut conn)?;
    seed_default_users(&conn)?;

    Ok(())
}

/// Insert the bootstrap accounts when the users table is empty.
///
/// Mirrors the deployment's first-run behavior: an `admin` and a regular
/// `user` account with well-known dev passwords, stored as argon2id hashes.
fn seed_default_users(conn: &rusqlite::Connection) -> Result<(), SnapbinError> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(|e| SnapbinError::Storage {
            source: Box::new(e),
        })?;
    if count > 0 {
        return Ok(());
    }

    let defaults = [
        ("admin", "admin123", "admin@example.com"),
        ("user", "user123", "user@example.com"),
    ];
    for (username, password, email) in defaults {
        let hash = hash_password(password)?;
        conn.execute(
            "INSERT INTO users (username, password_hash, email, status) VALUES (?1, ?2, ?3, 'active')",
            rusqlite::params![username, hash, email],
        )
        .map_err(|e| SnapbinError::Storage {
            source: Box::new(e),
        })?;
    }

    info!(count = defaults.len(), "seeded default users");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_and_seeds_users() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                Ok::<i64, rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_does_not_reseed() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.connection()
            .call(|conn| {
                conn.execute("DELETE FROM users WHERE username = 'user'", [])?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
        db.close().await.unwrap();

        // Table is non-empty (admin remains), so reopening must not reseed.
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                Ok::<i64, rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/data/test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        assert!(db_path.exists());
    }
}
