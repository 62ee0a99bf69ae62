// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use ticketbot_core::TicketbotError;

use crate::migrations;

/// Convert a tokio-rusqlite error into TicketbotError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TicketbotError {
    TicketbotError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite writer connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run pending
    /// migrations.
    pub async fn open(path: &str) -> Result<Self, TicketbotError> {
        Self::open_with_options(path, true).await
    }

    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, TicketbotError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| TicketbotError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| TicketbotError::Storage {
                source: Box::new(e),
            })?;

        let journal_mode = conn
            .call(move |conn| {
                conn.busy_timeout(Duration::from_secs(5))?;
                conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")?;
                let mode = if wal_mode { "WAL" } else { "DELETE" };
                conn.query_row(&format!("PRAGMA journal_mode = {mode}"), [], |row| {
                    row.get::<_, String>(0)
                })
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path, journal_mode = %journal_mode, "database pragmas applied");

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e: tokio_rusqlite::Error<refinery::Error>| TicketbotError::Storage {
                source: Box::new(e),
            })?;

        info!(path, "database opened");
        Ok(Self { conn })
    }

    /// The single writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), TicketbotError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                     AND name != 'refinery_schema_history' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()
            })
            .await
            .map_err(map_tr_err)
            .unwrap();

        assert_eq!(
            tables,
            vec![
                "bot_content",
                "events",
                "messages",
                "reservations",
                "tasks",
                "user_profiles",
                "users"
            ]
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();

        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_enabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .map_err(map_tr_err)
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
