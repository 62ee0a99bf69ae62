// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event seeding and lookup. Events are read-only once seeded.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use ticketbot_core::TicketbotError;

use crate::database::{Database, map_tr_err};
use crate::models::{Event, event_from_row, to_sql_time};

/// Insert an event for `date` unless one exists, then return the stored row.
pub async fn seed_event(db: &Database, date: DateTime<Utc>) -> Result<Event, TicketbotError> {
    let date = to_sql_time(date);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO events (date) VALUES (?1) ON CONFLICT(date) DO NOTHING",
                params![date],
            )?;
            conn.query_row(
                "SELECT id, date FROM events WHERE date = ?1",
                params![date],
                event_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_event(db: &Database, id: i64) -> Result<Option<Event>, TicketbotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, date FROM events WHERE id = ?1",
                params![id],
                event_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All events, earliest first.
pub async fn list_events(db: &Database) -> Result<Vec<Event>, TicketbotError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id, date FROM events ORDER BY date, id")?;
            let rows = stmt.query_map([], event_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
