// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite columns and the domain types.
//!
//! The canonical types live in `ticketbot-core::types`. Timestamps are stored
//! as UTC RFC 3339 text with second precision.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub use ticketbot_core::types::{
    ContentEntry, Event, LoggedMessage, Reservation, ReservationStatus, Task, TaskKind, User,
    UserProfile,
};
use ticketbot_core::{ConversationState, Role};

/// Formats a timestamp for storage.
pub fn to_sql_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn opt_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, e))
    })
    .transpose()
}

fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

/// `SELECT id, state, role_bitmask`
pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let state: String = row.get(1)?;
    Ok(User {
        id: row.get(0)?,
        state: ConversationState::decode(&state),
        role: Role::from_bitmask(row.get(2)?),
    })
}

/// `SELECT user_id, username, first_name, last_name`
pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        user_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
    })
}

/// `SELECT id, date`
pub fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        date: time_at(row, 1)?,
    })
}

/// Column list matching [`reservation_from_row`].
pub const RESERVATION_COLUMNS: &str = "id, user_id, event_id, entered_name, time_booked, status";

pub fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        event_id: row.get(2)?,
        entered_name: row.get(3)?,
        time_booked: opt_time_at(row, 4)?,
        status: parsed_at::<ReservationStatus>(row, 5)?,
    })
}

/// `SELECT id, kind, event_id`
pub fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        kind: parsed_at::<TaskKind>(row, 1)?,
        event_id: row.get(2)?,
    })
}

/// `SELECT id, user_id, text, sent_at`
pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<LoggedMessage> {
    Ok(LoggedMessage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        sent_at: time_at(row, 3)?,
    })
}
