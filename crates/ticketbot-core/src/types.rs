// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities and transport-neutral message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::role::Role;
use crate::state::ConversationState;

/// Identifier of a message delivered through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter plugged into the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Exporter,
}

// --- Identity ---

/// A bot user, keyed by the external (chat platform) identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub state: ConversationState,
    pub role: Role,
}

impl User {
    /// A freshly observed user: idle, no privileges.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            state: ConversationState::Idle,
            role: Role::Regular,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_effective_admin(&self) -> bool {
        self.role.is_effective_admin()
    }
}

/// Display profile captured from the chat platform on every message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl UserProfile {
    /// First and last name joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }

    pub fn username_or_empty(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}

// --- Content ---

/// An admin-editable piece of bot-facing text or an image file reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub literal: String,
    pub content: String,
    /// Serialized rich-text entities (JSON array of [`TextEntity`]).
    pub metadata: String,
}

// --- Reservations ---

/// A bookable occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub date: DateTime<Utc>,
}

/// Two-phase reservation status. Transitions only go forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ReservationStatus {
    Booked,
    Paid,
}

/// A seat held by a user for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub entered_name: String,
    pub time_booked: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
}

/// Result of a payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The reservation moved from Booked to Paid by this call.
    Transitioned(Reservation),
    /// The reservation was already Paid; nothing changed.
    AlreadyPaid(Reservation),
}

impl PaymentOutcome {
    pub fn reservation(&self) -> &Reservation {
        match self {
            Self::Transitioned(r) | Self::AlreadyPaid(r) => r,
        }
    }
}

/// Kinds of durable background work.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum TaskKind {
    SyncSheet,
    NotifyAboutEvent,
}

/// A durable work item scheduled by the engine and executed by the job runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub kind: TaskKind,
    pub event_id: Option<i64>,
}

/// A raw inbound user message, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedMessage {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// One row of the paid-reservation export snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub entered_name: String,
    pub event_date: String,
    pub phone: String,
    pub status: String,
}

// --- Transport ---

/// What kind of update arrived from the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InboundKind {
    Message,
    Callback,
    ChannelPost,
}

/// The account that produced an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Sender {
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// One resolution of an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub size: u64,
}

/// A rich-text annotation in Bot API shape (`type`, `offset`, `length`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TextEntity {
    pub fn new(kind: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            kind: kind.into(),
            offset,
            length,
            url: None,
            language: None,
        }
    }
}

/// A channel-agnostic inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub kind: InboundKind,
    /// `None` for channel posts without an author.
    pub sender: Option<Sender>,
    pub chat_id: i64,
    pub message_id: Option<MessageId>,
    pub text: Option<String>,
    pub entities: Vec<TextEntity>,
    pub photo_variants: Vec<PhotoVariant>,
    pub callback_id: Option<String>,
    pub callback_data: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl InboundEvent {
    /// A plain text (or command) message from `sender` in a private chat.
    pub fn message(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            kind: InboundKind::Message,
            chat_id: sender.id,
            sender: Some(sender),
            message_id: None,
            text: Some(text.into()),
            entities: Vec::new(),
            photo_variants: Vec::new(),
            callback_id: None,
            callback_data: None,
            sent_at: Utc::now(),
        }
    }

    /// A button press carrying `data`.
    pub fn callback(sender: Sender, data: impl Into<String>) -> Self {
        Self {
            kind: InboundKind::Callback,
            chat_id: sender.id,
            sender: Some(sender),
            message_id: None,
            text: None,
            entities: Vec::new(),
            photo_variants: Vec::new(),
            callback_id: Some(format!("cb-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0))),
            callback_data: Some(data.into()),
            sent_at: Utc::now(),
        }
    }

    /// A post published in a channel the bot administers.
    pub fn channel_post(chat_id: i64, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            kind: InboundKind::ChannelPost,
            sender: None,
            chat_id,
            message_id: Some(message_id),
            text: Some(text.into()),
            entities: Vec::new(),
            photo_variants: Vec::new(),
            callback_id: None,
            callback_data: None,
            sent_at: Utc::now(),
        }
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.sender.as_ref().map(|s| s.id)
    }

    /// The largest photo variant by byte size, if any.
    pub fn largest_photo(&self) -> Option<&PhotoVariant> {
        self.photo_variants.iter().max_by_key(|p| p.size)
    }
}

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// Inline keyboard attached to an outbound message, one `Vec` per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One button per row.
    pub fn single_column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// All callback payloads in row order.
    pub fn callback_payloads(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| match &b.action {
                ButtonAction::Callback(data) => Some(data.as_str()),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }
}

/// Body of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundContent {
    Text(String),
    /// `file_ref` is a platform file id previously received from a user.
    Photo { file_ref: String, caption: String },
}

/// A message to be delivered through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub content: OutboundContent,
    pub keyboard: Option<Keyboard>,
    pub entities: Vec<TextEntity>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: OutboundContent::Text(text.into()),
            keyboard: None,
            entities: Vec::new(),
        }
    }

    pub fn photo(chat_id: i64, file_ref: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            chat_id,
            content: OutboundContent::Photo {
                file_ref: file_ref.into(),
                caption: caption.into(),
            },
            keyboard: None,
            entities: Vec::new(),
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn with_entities(mut self, entities: Vec<TextEntity>) -> Self {
        self.entities = entities;
        self
    }

    /// The text body or the photo caption.
    pub fn body(&self) -> &str {
        match &self.content {
            OutboundContent::Text(t) => t,
            OutboundContent::Photo { caption, .. } => caption,
        }
    }
}

/// A user's standing in a chat, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MembershipStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MembershipStatus {
    /// Owners, administrators and plain members count as subscribed.
    pub fn is_subscribed(self) -> bool {
        matches!(self, Self::Owner | Self::Administrator | Self::Member)
    }
}
