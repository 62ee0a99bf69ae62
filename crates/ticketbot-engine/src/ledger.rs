// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reservation ledger: seat bookkeeping and the Booked -> Paid lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ticketbot_config::model::{EventSeedConfig, ReservationConfig};
use ticketbot_core::types::{Event, PaymentOutcome, Reservation};
use ticketbot_core::{StorageAdapter, TicketbotError};
use tracing::info;

/// Capacity-aware reservation operations.
///
/// Capacity and uniqueness are enforced by the storage adapter inside one
/// transaction; the ledger supplies the configured limit and default name.
#[derive(Clone)]
pub struct Ledger {
    storage: Arc<dyn StorageAdapter>,
    seat_limit: u32,
    default_name: String,
}

impl Ledger {
    pub fn new(storage: Arc<dyn StorageAdapter>, config: &ReservationConfig) -> Self {
        Self {
            storage,
            seat_limit: config.seat_limit,
            default_name: config.default_name.clone(),
        }
    }

    pub fn seat_limit(&self) -> u32 {
        self.seat_limit
    }

    /// Books a seat for `user_id`.
    ///
    /// Fails with `NotFound` for an unknown event, `DuplicateReservation`
    /// when the user already holds one, `CapacityExceeded` when full.
    pub async fn create_reservation(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<Reservation, TicketbotError> {
        let reservation = self
            .storage
            .create_reservation(user_id, event_id, &self.default_name, self.seat_limit)
            .await?;
        info!(
            reservation_id = reservation.id,
            user_id, event_id, "reservation created"
        );
        Ok(reservation)
    }

    pub async fn get(&self, reservation_id: i64) -> Result<Reservation, TicketbotError> {
        self.storage
            .get_reservation(reservation_id)
            .await?
            .ok_or_else(|| TicketbotError::not_found("reservation", reservation_id))
    }

    pub async fn record_name(
        &self,
        reservation_id: i64,
        name: &str,
        booked_at: DateTime<Utc>,
    ) -> Result<Reservation, TicketbotError> {
        self.storage
            .record_reservation_name(reservation_id, name, booked_at)
            .await
    }

    /// Confirms payment. Never reverts; a second call reports `AlreadyPaid`.
    pub async fn mark_paid(&self, reservation_id: i64) -> Result<PaymentOutcome, TicketbotError> {
        let outcome = self.storage.mark_reservation_paid(reservation_id).await?;
        if let PaymentOutcome::Transitioned(r) = &outcome {
            info!(reservation_id = r.id, user_id = r.user_id, "reservation paid");
        }
        Ok(outcome)
    }

    pub async fn list_by_event(&self, event_id: i64) -> Result<Vec<Reservation>, TicketbotError> {
        self.storage.list_reservations_by_event(event_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Reservation>, TicketbotError> {
        self.storage.list_reservations().await
    }

    pub async fn count_by_event(&self, event_id: i64) -> Result<u32, TicketbotError> {
        self.storage.count_reservations(event_id).await
    }

    pub async fn event(&self, event_id: i64) -> Result<Event, TicketbotError> {
        self.storage
            .get_event(event_id)
            .await?
            .ok_or_else(|| TicketbotError::not_found("event", event_id))
    }

    /// Inserts the configured events that are not stored yet.
    pub async fn seed_events(
        &self,
        seeds: &[EventSeedConfig],
    ) -> Result<Vec<Event>, TicketbotError> {
        let mut events = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let date = seed
                .parse_date()
                .map_err(|_| TicketbotError::malformed("event date", seed.date.clone()))?;
            events.push(self.storage.seed_event(date).await?);
        }
        info!(count = events.len(), "events seeded");
        Ok(events)
    }

    /// Events strictly after `now`, earliest first.
    pub async fn upcoming_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>, TicketbotError> {
        let events = self.storage.list_events().await?;
        Ok(events.into_iter().filter(|e| e.date > now).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ticketbot_config::model::StorageConfig;
    use ticketbot_core::ReservationStatus;
    use ticketbot_storage::SqliteStorage;

    async fn ledger(seat_limit: u32) -> (Ledger, Arc<SqliteStorage>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("ledger.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();
        let config = ReservationConfig {
            seat_limit,
            default_name: "Not specified".into(),
        };
        (Ledger::new(storage.clone(), &config), storage, dir)
    }

    #[tokio::test]
    async fn create_uses_default_name_and_booked_status() {
        let (ledger, storage, _dir) = ledger(2).await;
        let event = storage
            .seed_event(Utc::now() + Duration::days(1))
            .await
            .unwrap();
        let r = ledger.create_reservation(1, event.id).await.unwrap();
        assert_eq!(r.entered_name, "Not specified");
        assert_eq!(r.status, ReservationStatus::Booked);
        assert!(r.time_booked.is_none());
        assert_eq!(ledger.count_by_event(event.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn capacity_and_duplicates_are_rejected() {
        let (ledger, storage, _dir) = ledger(1).await;
        let event = storage
            .seed_event(Utc::now() + Duration::days(1))
            .await
            .unwrap();
        ledger.create_reservation(1, event.id).await.unwrap();

        assert!(matches!(
            ledger.create_reservation(1, event.id).await,
            Err(TicketbotError::DuplicateReservation { .. })
        ));
        assert!(matches!(
            ledger.create_reservation(2, event.id).await,
            Err(TicketbotError::CapacityExceeded { seat_limit: 1, .. })
        ));
        assert!(matches!(
            ledger.create_reservation(2, 999).await,
            Err(TicketbotError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mark_paid_twice_is_not_an_error() {
        let (ledger, storage, _dir) = ledger(5).await;
        let event = storage
            .seed_event(Utc::now() + Duration::days(1))
            .await
            .unwrap();
        let r = ledger.create_reservation(1, event.id).await.unwrap();

        let first = ledger.mark_paid(r.id).await.unwrap();
        assert!(matches!(first, PaymentOutcome::Transitioned(_)));
        let second = ledger.mark_paid(r.id).await.unwrap();
        assert!(matches!(second, PaymentOutcome::AlreadyPaid(_)));
        assert_eq!(ledger.get(r.id).await.unwrap().status, ReservationStatus::Paid);
    }

    #[tokio::test]
    async fn upcoming_skips_past_events() {
        let (ledger, storage, _dir) = ledger(5).await;
        let now = Utc::now();
        storage.seed_event(now - Duration::hours(1)).await.unwrap();
        let later = storage.seed_event(now + Duration::days(2)).await.unwrap();
        let sooner = storage.seed_event(now + Duration::days(1)).await.unwrap();

        let upcoming = ledger.upcoming_events(now).await.unwrap();
        let ids: Vec<i64> = upcoming.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }

    #[tokio::test]
    async fn seeding_is_idempotent_by_date() {
        let (ledger, _storage, _dir) = ledger(5).await;
        let seeds = vec![
            EventSeedConfig {
                date: "2025-03-28T18:00:00+04:00".into(),
            },
            EventSeedConfig {
                date: "2025-04-01T18:00:00+04:00".into(),
            },
        ];
        let first = ledger.seed_events(&seeds).await.unwrap();
        let second = ledger.seed_events(&seeds).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.event(first[0].id).await.unwrap().date.to_rfc3339(), "2025-03-28T14:00:00+00:00");

        let bad = vec![EventSeedConfig { date: "soon".into() }];
        assert!(matches!(
            ledger.seed_events(&bad).await,
            Err(TicketbotError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (ledger, _storage, _dir) = ledger(5).await;
        assert!(matches!(
            ledger.get(77).await,
            Err(TicketbotError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.event(77).await,
            Err(TicketbotError::NotFound { .. })
        ));
    }
}
