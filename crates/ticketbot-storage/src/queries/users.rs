// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User and profile operations.

use rusqlite::{OptionalExtension, params};

use ticketbot_core::role::ADMIN_BIT;
use ticketbot_core::{ConversationState, Role, TicketbotError};

use crate::database::{Database, map_tr_err};
use crate::models::{User, UserProfile, profile_from_row, user_from_row};

/// Fetch a user, inserting an idle, unprivileged row on first sight.
pub async fn get_or_create_user(db: &Database, id: i64) -> Result<User, TicketbotError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, state, role_bitmask) VALUES (?1, ?2, 0)
                 ON CONFLICT(id) DO NOTHING",
                params![id, ConversationState::Idle.encode()],
            )?;
            conn.query_row(
                "SELECT id, state, role_bitmask FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, id: i64) -> Result<Option<User>, TicketbotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, state, role_bitmask FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the state token. Fails with NotFound for unknown users.
pub async fn set_state(
    db: &Database,
    id: i64,
    state: &ConversationState,
) -> Result<(), TicketbotError> {
    let token = state.encode();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET state = ?1 WHERE id = ?2",
                params![token, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(TicketbotError::not_found("user", id));
    }
    Ok(())
}

pub async fn set_role(db: &Database, id: i64, role: Role) -> Result<(), TicketbotError> {
    let mask = role.to_bitmask();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET role_bitmask = ?1 WHERE id = ?2",
                params![mask, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(TicketbotError::not_found("user", id));
    }
    Ok(())
}

/// Every user with the admin bit set, preview mode included.
pub async fn list_admins(db: &Database) -> Result<Vec<User>, TicketbotError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, state, role_bitmask FROM users
                 WHERE role_bitmask & ?1 = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![ADMIN_BIT], user_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_user_ids(db: &Database) -> Result<Vec<i64>, TicketbotError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<Vec<i64>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or refresh a profile snapshot.
pub async fn upsert_profile(db: &Database, profile: &UserProfile) -> Result<(), TicketbotError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO user_profiles (user_id, username, first_name, last_name, updated_at)
                 VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                 ON CONFLICT(user_id) DO UPDATE SET
                    username = excluded.username,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    updated_at = excluded.updated_at",
                params![
                    profile.user_id,
                    profile.username,
                    profile.first_name,
                    profile.last_name,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_profile(db: &Database, user_id: i64) -> Result<Option<UserProfile>, TicketbotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT user_id, username, first_name, last_name
                 FROM user_profiles WHERE user_id = ?1",
                params![user_id],
                profile_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
