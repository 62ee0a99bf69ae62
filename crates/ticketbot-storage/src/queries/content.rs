// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin-editable content entries.

use rusqlite::{OptionalExtension, params};

use ticketbot_core::TicketbotError;

use crate::database::{Database, map_tr_err};
use crate::models::ContentEntry;

pub async fn get_content(db: &Database, literal: &str) -> Result<Option<ContentEntry>, TicketbotError> {
    let literal = literal.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT literal, content, metadata FROM bot_content WHERE literal = ?1",
                params![literal],
                |row| {
                    Ok(ContentEntry {
                        literal: row.get(0)?,
                        content: row.get(1)?,
                        metadata: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace; last write wins.
pub async fn set_content(db: &Database, entry: &ContentEntry) -> Result<(), TicketbotError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bot_content (literal, content, metadata, updated_at)
                 VALUES (?1, ?2, ?3, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                 ON CONFLICT(literal) DO UPDATE SET
                    content = excluded.content,
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at",
                params![entry.literal, entry.content, entry.metadata],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
