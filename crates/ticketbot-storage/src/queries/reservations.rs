// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reservation ledger operations.
//!
//! Creation runs its capacity check and insert inside one `BEGIN IMMEDIATE`
//! transaction on the writer thread, so concurrent bookings for the last
//! seat cannot both succeed. The `(user_id, event_id)` unique index backs
//! the one-reservation-per-user rule.

use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension, Rows, TransactionBehavior, params};
use tracing::warn;

use ticketbot_core::TicketbotError;
use ticketbot_core::types::PaymentOutcome;

use crate::database::{Database, map_tr_err};
use crate::models::{
    RESERVATION_COLUMNS, Reservation, ReservationStatus, reservation_from_row, to_sql_time,
};

/// What happened inside the creation transaction.
enum CreateOutcome {
    Created(Reservation),
    NoEvent,
    Duplicate,
    SoldOut,
}

fn select_one(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Reservation>> {
    conn.query_row(
        &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"),
        params![id],
        reservation_from_row,
    )
    .optional()
}

/// Decodes rows one by one, skipping any that no longer parse.
fn decode_rows(mut rows: Rows<'_>) -> rusqlite::Result<Vec<Reservation>> {
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        match reservation_from_row(row) {
            Ok(reservation) => out.push(reservation),
            Err(e) => {
                let id: i64 = row.get(0)?;
                warn!(reservation_id = id, error = %e, "skipping undecodable reservation");
            }
        }
    }
    Ok(out)
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

/// Create a Booked reservation, enforcing capacity and uniqueness atomically.
pub async fn create(
    db: &Database,
    user_id: i64,
    event_id: i64,
    default_name: &str,
    seat_limit: u32,
) -> Result<Reservation, TicketbotError> {
    let default_name = default_name.to_string();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let event_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1)",
                params![event_id],
                |row| row.get(0),
            )?;
            if !event_exists {
                return Ok(CreateOutcome::NoEvent);
            }

            let already: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = ?1 AND event_id = ?2)",
                params![user_id, event_id],
                |row| row.get(0),
            )?;
            if already {
                return Ok(CreateOutcome::Duplicate);
            }

            let taken: u32 = tx.query_row(
                "SELECT COUNT(*) FROM reservations WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )?;
            if taken >= seat_limit {
                return Ok(CreateOutcome::SoldOut);
            }

            let inserted = tx.execute(
                "INSERT INTO reservations (user_id, event_id, entered_name, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user_id,
                    event_id,
                    default_name,
                    ReservationStatus::Booked.to_string()
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(CreateOutcome::Duplicate),
                Err(e) => return Err(e),
            }

            let id = tx.last_insert_rowid();
            let reservation = select_one(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(CreateOutcome::Created(reservation))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        CreateOutcome::Created(reservation) => Ok(reservation),
        CreateOutcome::NoEvent => Err(TicketbotError::not_found("event", event_id)),
        CreateOutcome::Duplicate => Err(TicketbotError::DuplicateReservation { user_id, event_id }),
        CreateOutcome::SoldOut => Err(TicketbotError::CapacityExceeded {
            event_id,
            seat_limit,
        }),
    }
}

pub async fn get(db: &Database, id: i64) -> Result<Option<Reservation>, TicketbotError> {
    db.connection()
        .call(move |conn| select_one(conn, id))
        .await
        .map_err(map_tr_err)
}

/// Record the attendee name and booking time.
///
/// Only Booked reservations accept a name; re-sending the same name to a
/// Paid reservation is a no-op rather than an error.
pub async fn record_name(
    db: &Database,
    id: i64,
    name: &str,
    booked_at: DateTime<Utc>,
) -> Result<Reservation, TicketbotError> {
    let requested = name.to_string();
    let name = requested.clone();
    let booked_at = to_sql_time(booked_at);
    let (before, after) = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(before) = select_one(&tx, id)? else {
                return Ok((None, None));
            };
            if before.status == ReservationStatus::Booked {
                tx.execute(
                    "UPDATE reservations SET entered_name = ?1, time_booked = ?2 WHERE id = ?3",
                    params![name, booked_at, id],
                )?;
            }
            let after = select_one(&tx, id)?;
            tx.commit()?;
            Ok((Some(before), after))
        })
        .await
        .map_err(map_tr_err)?;

    let (Some(before), Some(after)) = (before, after) else {
        return Err(TicketbotError::not_found("reservation", id));
    };
    match before.status {
        ReservationStatus::Booked => Ok(after),
        ReservationStatus::Paid if before.entered_name == requested => Ok(after),
        status => Err(TicketbotError::InvalidTransition {
            reservation_id: id,
            status,
            action: "record name",
        }),
    }
}

/// Move a reservation to Paid. Never reverts; a second call reports
/// [`PaymentOutcome::AlreadyPaid`].
pub async fn mark_paid(db: &Database, id: i64) -> Result<PaymentOutcome, TicketbotError> {
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE reservations SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![
                    ReservationStatus::Paid.to_string(),
                    id,
                    ReservationStatus::Booked.to_string()
                ],
            )?;
            let current = select_one(&tx, id)?;
            tx.commit()?;
            Ok(current.map(|r| {
                if changed == 1 {
                    PaymentOutcome::Transitioned(r)
                } else {
                    PaymentOutcome::AlreadyPaid(r)
                }
            }))
        })
        .await
        .map_err(map_tr_err)?;

    outcome.ok_or_else(|| TicketbotError::not_found("reservation", id))
}

pub async fn list_by_event(db: &Database, event_id: i64) -> Result<Vec<Reservation>, TicketbotError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE event_id = ?1 ORDER BY id"
            ))?;
            decode_rows(stmt.query(params![event_id])?)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_all(db: &Database) -> Result<Vec<Reservation>, TicketbotError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY id"
            ))?;
            decode_rows(stmt.query([])?)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_by_event(db: &Database, event_id: i64) -> Result<u32, TicketbotError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM reservations WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::queries::events::seed_event;
    use crate::queries::test_support::setup_db;

    async fn seeded_event(db: &Database) -> i64 {
        let date = Utc.with_ymd_and_hms(2025, 3, 28, 14, 0, 0).unwrap();
        seed_event(db, date).await.unwrap().id
    }

    #[tokio::test]
    async fn create_starts_booked_with_default_name() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;

        let r = create(&db, 10, event, "Not specified", 10).await.unwrap();
        assert_eq!(r.user_id, 10);
        assert_eq!(r.event_id, event);
        assert_eq!(r.entered_name, "Not specified");
        assert_eq!(r.status, ReservationStatus::Booked);
        assert!(r.time_booked.is_none());
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;

        create(&db, 10, event, "x", 10).await.unwrap();
        let err = create(&db, 10, event, "x", 10).await.unwrap_err();
        assert!(matches!(
            err,
            TicketbotError::DuplicateReservation { user_id: 10, .. }
        ));
        assert_eq!(count_by_event(&db, event).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = create(&db, 10, 77, "x", 10).await.unwrap_err();
        assert!(matches!(err, TicketbotError::NotFound { entity: "event", .. }));
    }

    #[tokio::test]
    async fn full_event_rejects_with_capacity_exceeded() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;
        for user in 0..3 {
            create(&db, user, event, "x", 3).await.unwrap();
        }

        let err = create(&db, 99, event, "x", 3).await.unwrap_err();
        assert!(matches!(
            err,
            TicketbotError::CapacityExceeded { seat_limit: 3, .. }
        ));
        assert_eq!(count_by_event(&db, event).await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_never_exceed_seat_limit() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;
        let db = Arc::new(db);

        let mut handles = Vec::new();
        for user in 0..40 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                create(&db, user, event, "x", 10).await
            }));
        }

        let mut created = 0;
        let mut sold_out = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(TicketbotError::CapacityExceeded { .. }) => sold_out += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 10);
        assert_eq!(sold_out, 30);
        assert_eq!(count_by_event(&db, event).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn record_name_sets_time_booked() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;
        let r = create(&db, 1, event, "Not specified", 10).await.unwrap();

        let at = Utc.with_ymd_and_hms(2025, 3, 20, 9, 30, 0).unwrap();
        let named = record_name(&db, r.id, "Ada Lovelace", at).await.unwrap();
        assert_eq!(named.entered_name, "Ada Lovelace");
        assert_eq!(named.time_booked, Some(at));

        // Changing the name while still Booked is allowed.
        let renamed = record_name(&db, r.id, "Ada L.", at).await.unwrap();
        assert_eq!(renamed.entered_name, "Ada L.");
    }

    #[tokio::test]
    async fn record_name_after_payment_is_invalid_unless_unchanged() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;
        let r = create(&db, 1, event, "Not specified", 10).await.unwrap();
        let at = Utc::now();
        record_name(&db, r.id, "Ada", at).await.unwrap();
        mark_paid(&db, r.id).await.unwrap();

        let same = record_name(&db, r.id, "Ada", at).await.unwrap();
        assert_eq!(same.status, ReservationStatus::Paid);

        let err = record_name(&db, r.id, "Grace", at).await.unwrap_err();
        assert!(matches!(
            err,
            TicketbotError::InvalidTransition {
                status: ReservationStatus::Paid,
                ..
            }
        ));
        let stored = get(&db, r.id).await.unwrap().unwrap();
        assert_eq!(stored.entered_name, "Ada");
    }

    #[tokio::test]
    async fn mark_paid_twice_reports_already_paid() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;
        let r = create(&db, 1, event, "x", 10).await.unwrap();

        let first = mark_paid(&db, r.id).await.unwrap();
        assert!(matches!(first, PaymentOutcome::Transitioned(_)));
        assert_eq!(first.reservation().status, ReservationStatus::Paid);

        let second = mark_paid(&db, r.id).await.unwrap();
        assert!(matches!(second, PaymentOutcome::AlreadyPaid(_)));
        assert_eq!(second.reservation().status, ReservationStatus::Paid);
    }

    #[tokio::test]
    async fn listings_skip_undecodable_rows() {
        let (db, _dir) = setup_db().await;
        let event = seeded_event(&db).await;
        let good = create(&db, 1, event, "x", 10).await.unwrap();
        let bad = create(&db, 2, event, "y", 10).await.unwrap();
        let bad_id = bad.id;
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE reservations SET time_booked = 'garbage' WHERE id = ?1",
                    params![bad_id],
                )
            })
            .await
            .unwrap();

        let all: Vec<i64> = list_all(&db).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(all, vec![good.id]);
        let by_event = list_by_event(&db, event).await.unwrap();
        assert_eq!(by_event.len(), 1);
        assert_eq!(count_by_event(&db, event).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mark_paid_unknown_id_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = mark_paid(&db, 12345).await.unwrap_err();
        assert!(matches!(err, TicketbotError::NotFound { entity: "reservation", .. }));
    }

    #[tokio::test]
    async fn listings_filter_by_event() {
        let (db, _dir) = setup_db().await;
        let a = seeded_event(&db).await;
        let b = seed_event(&db, Utc.with_ymd_and_hms(2025, 4, 1, 14, 0, 0).unwrap())
            .await
            .unwrap()
            .id;
        create(&db, 1, a, "x", 10).await.unwrap();
        create(&db, 2, a, "x", 10).await.unwrap();
        create(&db, 1, b, "x", 10).await.unwrap();

        assert_eq!(list_by_event(&db, a).await.unwrap().len(), 2);
        assert_eq!(list_by_event(&db, b).await.unwrap().len(), 1);
        assert_eq!(list_all(&db).await.unwrap().len(), 3);
        assert_eq!(count_by_event(&db, b).await.unwrap(), 1);
    }
}
