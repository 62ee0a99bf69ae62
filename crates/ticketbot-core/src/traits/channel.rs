// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the chat transport (Telegram).

use async_trait::async_trait;

use crate::error::TicketbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, MembershipStatus, MessageId, OutboundMessage};

/// Adapter for the bidirectional chat transport.
///
/// Delivery is best effort: a failed send surfaces as
/// [`TicketbotError::Transport`] and is never retried by the adapter.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), TicketbotError>;

    /// Receives the next inbound update.
    async fn receive(&self) -> Result<InboundEvent, TicketbotError>;

    /// Sends a text or photo message, optionally with an inline keyboard.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TicketbotError>;

    async fn delete_message(&self, chat_id: i64, message_id: &MessageId)
    -> Result<(), TicketbotError>;

    /// Acknowledges a button press so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TicketbotError>;

    /// Looks up `user_id`'s standing in `chat_id`.
    async fn chat_membership(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<MembershipStatus, TicketbotError>;
}
