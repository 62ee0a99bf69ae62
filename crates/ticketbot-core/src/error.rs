// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ticketbot engine and its adapters.

use thiserror::Error;

use crate::types::ReservationStatus;

/// The primary error type used across all Ticketbot adapter traits and engine operations.
///
/// Business-rule variants (`DuplicateReservation`, `CapacityExceeded`,
/// `InvalidTransition`) are expected outcomes that handlers turn into user
/// messages. None of the variants is meant to terminate the process.
#[derive(Debug, Error)]
pub enum TicketbotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (send/delivery failure, rejected request, rate limiting).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An entity (content entry, user, event, reservation) does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The user already holds a reservation for the event.
    #[error("user {user_id} already holds a reservation for event {event_id}")]
    DuplicateReservation { user_id: i64, event_id: i64 },

    /// Every seat of the event is taken.
    #[error("event {event_id} is sold out ({seat_limit} seats)")]
    CapacityExceeded { event_id: i64, seat_limit: u32 },

    /// The reservation is not in a status that allows the requested change.
    #[error("reservation {reservation_id} is {status}, cannot {action}")]
    InvalidTransition {
        reservation_id: i64,
        status: ReservationStatus,
        action: &'static str,
    },

    /// An operator-provided setting (support chat, channel id, link) is unset.
    #[error("configuration missing: {key}")]
    ConfigurationMissing { key: String },

    /// An unparseable callback payload, state token, or stored value.
    #[error("malformed {what}: {input:?}")]
    Malformed { what: &'static str, input: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TicketbotError {
    /// Shorthand for a [`TicketbotError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`TicketbotError::Malformed`].
    pub fn malformed(what: &'static str, input: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            input: input.into(),
        }
    }

    /// Wraps a transport-layer failure.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for errors that represent a rule violation the user should
    /// be told about, rather than a fault.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::DuplicateReservation { .. }
                | Self::CapacityExceeded { .. }
                | Self::InvalidTransition { .. }
        )
    }
}
