// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use ticketbot_config::model::StorageConfig;
use ticketbot_core::types::{
    ContentEntry, Event, PaymentOutcome, Reservation, Task, TaskKind, User, UserProfile,
};
use ticketbot_core::{
    AdapterType, ConversationState, HealthStatus, PluginAdapter, Role, StorageAdapter,
    TicketbotError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, TicketbotError> {
        self.db.get().ok_or_else(|| TicketbotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), TicketbotError> {
        db.connection()
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TicketbotError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TicketbotError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), TicketbotError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| TicketbotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TicketbotError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Users ---

    async fn get_or_create_user(&self, id: i64) -> Result<User, TicketbotError> {
        queries::users::get_or_create_user(self.db()?, id).await
    }

    async fn set_user_state(
        &self,
        id: i64,
        state: &ConversationState,
    ) -> Result<(), TicketbotError> {
        queries::users::set_state(self.db()?, id, state).await
    }

    async fn set_user_role(&self, id: i64, role: Role) -> Result<(), TicketbotError> {
        queries::users::set_role(self.db()?, id, role).await
    }

    async fn list_admins(&self) -> Result<Vec<User>, TicketbotError> {
        queries::users::list_admins(self.db()?).await
    }

    async fn list_user_ids(&self) -> Result<Vec<i64>, TicketbotError> {
        queries::users::list_user_ids(self.db()?).await
    }

    // --- Profiles ---

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), TicketbotError> {
        queries::users::upsert_profile(self.db()?, profile).await
    }

    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>, TicketbotError> {
        queries::users::get_profile(self.db()?, user_id).await
    }

    // --- Content ---

    async fn get_content(&self, literal: &str) -> Result<Option<ContentEntry>, TicketbotError> {
        queries::content::get_content(self.db()?, literal).await
    }

    async fn set_content(&self, entry: &ContentEntry) -> Result<(), TicketbotError> {
        queries::content::set_content(self.db()?, entry).await
    }

    // --- Events ---

    async fn seed_event(&self, date: DateTime<Utc>) -> Result<Event, TicketbotError> {
        queries::events::seed_event(self.db()?, date).await
    }

    async fn get_event(&self, id: i64) -> Result<Option<Event>, TicketbotError> {
        queries::events::get_event(self.db()?, id).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, TicketbotError> {
        queries::events::list_events(self.db()?).await
    }

    // --- Reservations ---

    async fn create_reservation(
        &self,
        user_id: i64,
        event_id: i64,
        default_name: &str,
        seat_limit: u32,
    ) -> Result<Reservation, TicketbotError> {
        queries::reservations::create(self.db()?, user_id, event_id, default_name, seat_limit)
            .await
    }

    async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>, TicketbotError> {
        queries::reservations::get(self.db()?, id).await
    }

    async fn record_reservation_name(
        &self,
        id: i64,
        name: &str,
        booked_at: DateTime<Utc>,
    ) -> Result<Reservation, TicketbotError> {
        queries::reservations::record_name(self.db()?, id, name, booked_at).await
    }

    async fn mark_reservation_paid(&self, id: i64) -> Result<PaymentOutcome, TicketbotError> {
        queries::reservations::mark_paid(self.db()?, id).await
    }

    async fn list_reservations_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<Reservation>, TicketbotError> {
        queries::reservations::list_by_event(self.db()?, event_id).await
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, TicketbotError> {
        queries::reservations::list_all(self.db()?).await
    }

    async fn count_reservations(&self, event_id: i64) -> Result<u32, TicketbotError> {
        queries::reservations::count_by_event(self.db()?, event_id).await
    }

    // --- Tasks ---

    async fn schedule_task(
        &self,
        kind: TaskKind,
        event_id: Option<i64>,
    ) -> Result<i64, TicketbotError> {
        queries::tasks::schedule(self.db()?, kind, event_id).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, TicketbotError> {
        queries::tasks::list(self.db()?).await
    }

    async fn delete_task(&self, id: i64) -> Result<(), TicketbotError> {
        queries::tasks::delete(self.db()?, id).await
    }

    // --- Message log ---

    async fn log_message(
        &self,
        user_id: i64,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), TicketbotError> {
        queries::messages::log_message(self.db()?, user_id, text, sent_at)
            .await
            .map(|_| ())
    }
}
