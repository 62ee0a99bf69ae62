// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TicketbotError;
use crate::role::Role;
use crate::state::ConversationState;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ContentEntry, Event, PaymentOutcome, Reservation, Task, TaskKind, User, UserProfile,
};

/// Adapter for storage and persistence backends.
///
/// Implementations own the reservation invariants: at most one reservation
/// per (user, event), a per-event count never above the seat limit, and a
/// status that only moves from Booked to Paid.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), TicketbotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), TicketbotError>;

    // --- Users ---

    /// Returns the user, creating it idle and unprivileged on first sight.
    async fn get_or_create_user(&self, id: i64) -> Result<User, TicketbotError>;

    async fn set_user_state(
        &self,
        id: i64,
        state: &ConversationState,
    ) -> Result<(), TicketbotError>;

    async fn set_user_role(&self, id: i64, role: Role) -> Result<(), TicketbotError>;

    /// All users holding the admin bit, previewing or not.
    async fn list_admins(&self) -> Result<Vec<User>, TicketbotError>;

    async fn list_user_ids(&self) -> Result<Vec<i64>, TicketbotError>;

    // --- Profiles ---

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), TicketbotError>;

    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>, TicketbotError>;

    // --- Content ---

    async fn get_content(&self, literal: &str) -> Result<Option<ContentEntry>, TicketbotError>;

    /// Inserts or replaces the entry with the same literal.
    async fn set_content(&self, entry: &ContentEntry) -> Result<(), TicketbotError>;

    // --- Events ---

    /// Inserts an event for `date` unless one already exists; returns it.
    async fn seed_event(&self, date: DateTime<Utc>) -> Result<Event, TicketbotError>;

    async fn get_event(&self, id: i64) -> Result<Option<Event>, TicketbotError>;

    /// All events ordered by date.
    async fn list_events(&self) -> Result<Vec<Event>, TicketbotError>;

    // --- Reservations ---

    /// Atomically checks capacity and uniqueness, then inserts a Booked
    /// reservation.
    async fn create_reservation(
        &self,
        user_id: i64,
        event_id: i64,
        default_name: &str,
        seat_limit: u32,
    ) -> Result<Reservation, TicketbotError>;

    async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>, TicketbotError>;

    /// Sets the attendee name and booking time of a Booked reservation.
    async fn record_reservation_name(
        &self,
        id: i64,
        name: &str,
        booked_at: DateTime<Utc>,
    ) -> Result<Reservation, TicketbotError>;

    async fn mark_reservation_paid(&self, id: i64) -> Result<PaymentOutcome, TicketbotError>;

    async fn list_reservations_by_event(
        &self,
        event_id: i64,
    ) -> Result<Vec<Reservation>, TicketbotError>;

    async fn list_reservations(&self) -> Result<Vec<Reservation>, TicketbotError>;

    async fn count_reservations(&self, event_id: i64) -> Result<u32, TicketbotError>;

    // --- Tasks ---

    async fn schedule_task(
        &self,
        kind: TaskKind,
        event_id: Option<i64>,
    ) -> Result<i64, TicketbotError>;

    /// Pending tasks in scheduling order.
    async fn list_tasks(&self) -> Result<Vec<Task>, TicketbotError>;

    async fn delete_task(&self, id: i64) -> Result<(), TicketbotError>;

    // --- Message log ---

    async fn log_message(
        &self,
        user_id: i64,
        text: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), TicketbotError>;
}
