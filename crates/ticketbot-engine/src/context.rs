// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared handles passed to every command, callback and free-text handler.

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use ticketbot_config::model::TicketbotConfig;
use ticketbot_core::types::{Keyboard, MessageId, OutboundMessage};
use ticketbot_core::{ChannelAdapter, StorageAdapter, TicketbotError};
use tracing::{debug, warn};

use crate::content::ContentStore;
use crate::identity::Identity;
use crate::ledger::Ledger;

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct BotContext {
    pub channel: Arc<dyn ChannelAdapter>,
    pub storage: Arc<dyn StorageAdapter>,
    pub content: ContentStore,
    pub identity: Identity,
    pub ledger: Ledger,
    pub config: Arc<TicketbotConfig>,
}

impl BotContext {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        config: Arc<TicketbotConfig>,
    ) -> Self {
        Self {
            content: ContentStore::new(storage.clone()),
            identity: Identity::new(storage.clone()),
            ledger: Ledger::new(storage.clone(), &config.reservation),
            channel,
            storage,
            config,
        }
    }

    /// Venue time zone. Falls back to UTC for an out-of-range offset.
    pub fn local_offset(&self) -> FixedOffset {
        self.config.bot.utc_offset().unwrap_or_else(|| Utc.fix())
    }

    pub async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TicketbotError> {
        self.channel.send(msg).await
    }

    pub async fn send_text(
        &self,
        chat_id: i64,
        text: impl Into<String>,
    ) -> Result<MessageId, TicketbotError> {
        self.send(OutboundMessage::text(chat_id, text)).await
    }

    /// Sends the content `literal` with its stored entities.
    pub async fn send_content(
        &self,
        chat_id: i64,
        literal: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageId, TicketbotError> {
        let mut msg = OutboundMessage::text(chat_id, self.content.text(literal).await)
            .with_entities(self.content.entities(literal).await);
        msg.keyboard = keyboard;
        self.send(msg).await
    }

    /// Best-effort delivery: failures are logged, never returned.
    pub async fn deliver(&self, msg: OutboundMessage) {
        let chat_id = msg.chat_id;
        if let Err(e) = self.send(msg).await {
            warn!(chat_id, error = %e, "delivery failed");
        }
    }

    /// Sends `text` to every admin, previewing or not.
    pub async fn alert_admins(&self, text: &str) {
        let admins = match self.identity.list_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(error = %e, "cannot list admins for alert");
                return;
            }
        };
        debug!(count = admins.len(), text, "alerting admins");
        for admin in admins {
            self.deliver(OutboundMessage::text(admin.id, text)).await;
        }
    }

    /// Sends `text` to the configured `admin.admin_id`, if any.
    pub async fn alert_operator(&self, text: &str) {
        match self.config.admin.admin_id {
            Some(admin_id) => self.deliver(OutboundMessage::text(admin_id, text)).await,
            None => warn!(text, "admin.admin_id is not set, alert dropped"),
        }
    }
}
