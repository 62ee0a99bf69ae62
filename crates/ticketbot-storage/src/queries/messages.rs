// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw inbound message log.

use chrono::{DateTime, Utc};
use rusqlite::params;

use ticketbot_core::TicketbotError;

use crate::database::{Database, map_tr_err};
use crate::models::{LoggedMessage, message_from_row, to_sql_time};

/// Append one inbound message. Returns the row id.
pub async fn log_message(
    db: &Database,
    user_id: i64,
    text: &str,
    sent_at: DateTime<Utc>,
) -> Result<i64, TicketbotError> {
    let text = text.to_string();
    let sent_at = to_sql_time(sent_at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (user_id, text, sent_at) VALUES (?1, ?2, ?3)",
                params![user_id, text, sent_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Messages from one user, oldest first, optionally limited to the latest `limit`.
pub async fn messages_for_user(
    db: &Database,
    user_id: i64,
    limit: Option<i64>,
) -> Result<Vec<LoggedMessage>, TicketbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, text, sent_at FROM (
                    SELECT id, user_id, text, sent_at FROM messages
                    WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2
                 ) ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![user_id, limit.unwrap_or(-1)], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    #[tokio::test]
    async fn log_and_read_back_in_order() {
        let (db, _dir) = setup_db().await;
        let now = Utc::now();
        log_message(&db, 1, "/start", now).await.unwrap();
        log_message(&db, 2, "other user", now).await.unwrap();
        log_message(&db, 1, "hello", now).await.unwrap();

        let all = messages_for_user(&db, 1, None).await.unwrap();
        let texts: Vec<&str> = all.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["/start", "hello"]);

        let last = messages_for_user(&db, 1, Some(1)).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].text, "hello");
    }
}
