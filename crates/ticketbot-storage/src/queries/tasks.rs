// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable background work items.

use rusqlite::params;
use tracing::warn;

use ticketbot_core::TicketbotError;

use crate::database::{Database, map_tr_err};
use crate::models::{Task, TaskKind, task_from_row};

/// Schedule a task. Returns its id.
pub async fn schedule(
    db: &Database,
    kind: TaskKind,
    event_id: Option<i64>,
) -> Result<i64, TicketbotError> {
    let kind = kind.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tasks (kind, event_id) VALUES (?1, ?2)",
                params![kind, event_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Pending tasks in the order they were scheduled.
///
/// Rows that no longer decode are deleted so they cannot block the queue.
pub async fn list(db: &Database) -> Result<Vec<Task>, TicketbotError> {
    db.connection()
        .call(|conn| {
            let mut tasks = Vec::new();
            let mut broken = Vec::new();
            {
                let mut stmt = conn.prepare("SELECT id, kind, event_id FROM tasks ORDER BY id")?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    match task_from_row(row) {
                        Ok(task) => tasks.push(task),
                        Err(e) => {
                            let id: i64 = row.get(0)?;
                            warn!(task_id = id, error = %e, "dropping undecodable task");
                            broken.push(id);
                        }
                    }
                }
            }
            for id in broken {
                conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            }
            Ok(tasks)
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a finished task. Deleting an absent id is not an error.
pub async fn delete(db: &Database, id: i64) -> Result<(), TicketbotError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    #[tokio::test]
    async fn schedule_list_delete() {
        let (db, _dir) = setup_db().await;
        let sync = schedule(&db, TaskKind::SyncSheet, None).await.unwrap();
        let notify = schedule(&db, TaskKind::NotifyAboutEvent, Some(3)).await.unwrap();

        let tasks = list(&db).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, sync);
        assert_eq!(tasks[0].kind, TaskKind::SyncSheet);
        assert_eq!(tasks[1].event_id, Some(3));

        delete(&db, sync).await.unwrap();
        delete(&db, sync).await.unwrap();
        let remaining = list(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, notify);
    }

    #[tokio::test]
    async fn undecodable_task_is_dropped_and_the_rest_listed() {
        let (db, _dir) = setup_db().await;
        let sync = schedule(&db, TaskKind::SyncSheet, None).await.unwrap();
        db.connection()
            .call(|conn| {
                conn.execute("INSERT INTO tasks (kind, event_id) VALUES ('Bogus', NULL)", [])
            })
            .await
            .unwrap();
        let notify = schedule(&db, TaskKind::NotifyAboutEvent, Some(5)).await.unwrap();

        let ids: Vec<i64> = list(&db).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![sync, notify]);

        let total: i64 = db
            .connection()
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(total, 2);
    }
}
