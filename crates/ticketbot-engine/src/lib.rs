// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and reservation engine for the Ticketbot reservation bot.
//!
//! The [`BotEngine`] is the central coordinator that:
//! - Receives updates from a channel adapter
//! - Runs each update on its own task, serialized per user
//! - Routes commands, free text, button presses and channel posts
//! - Persists state transitions and reservation changes through storage
//! - Drains in-flight handlers on shutdown

pub mod callbacks;
pub mod commands;
pub mod content;
pub mod context;
pub mod conversation;
pub mod export;
pub mod format;
pub mod identity;
pub mod jobs;
pub mod keyed_lock;
pub mod ledger;
pub mod panel;
pub mod router;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use ticketbot_config::model::TicketbotConfig;
use ticketbot_core::types::{InboundEvent, InboundKind};
use ticketbot_core::{ChannelAdapter, StorageAdapter, TicketbotError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use commands::{CommandHandler, CommandRegistry};
pub use context::BotContext;
pub use export::CsvExporter;
pub use jobs::JobRunner;

use crate::keyed_lock::KeyedLock;
use crate::router::Route;

/// How long shutdown waits for in-flight handlers.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Receives updates and drives the conversation state machine.
#[derive(Clone)]
pub struct BotEngine {
    ctx: BotContext,
    commands: Arc<CommandRegistry>,
    locks: Arc<KeyedLock>,
    tracker: TaskTracker,
}

impl BotEngine {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        config: Arc<TicketbotConfig>,
        commands: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            ctx: BotContext::new(channel, storage, config),
            commands,
            locks: Arc::new(KeyedLock::new()),
            tracker: TaskTracker::new(),
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Runs until the cancellation token is triggered or the channel closes.
    ///
    /// Every update is handled on its own task; on exit the engine waits for
    /// those tasks before returning.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), TicketbotError> {
        info!(bot = %self.ctx.config.bot.name, "engine running");

        loop {
            tokio::select! {
                event = self.ctx.channel.receive() => {
                    match event {
                        Ok(event) => {
                            let engine = self.clone();
                            self.tracker.spawn(async move { engine.dispatch(event).await });
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping engine");
                    break;
                }
            }
        }

        shutdown::drain_tasks(&self.tracker, DRAIN_TIMEOUT).await;
        self.locks.prune();
        info!("engine stopped");
        Ok(())
    }

    /// Handles one update and logs the outcome instead of returning it.
    pub async fn dispatch(&self, event: InboundEvent) {
        let sender = event.sender_id();
        match self.handle_event(&event).await {
            Ok(()) => {}
            Err(e) if e.is_business_rule() => {
                warn!(sender, kind = %event.kind, error = %e, "update rejected");
            }
            Err(e) => {
                error!(sender, kind = %event.kind, error = %e, "failed to handle update");
            }
        }
    }

    /// Handles one update while holding the sender's lock.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<(), TicketbotError> {
        if event.kind == InboundKind::ChannelPost {
            return conversation::handle_channel_post(&self.ctx, event).await;
        }
        let Some(sender) = &event.sender else {
            debug!(kind = %event.kind, chat_id = event.chat_id, "update without sender ignored");
            return Ok(());
        };

        let _guard = self.locks.lock(sender.id).await;
        let mut user = self.ctx.identity.get_or_create(sender.id).await?;

        if let Err(e) = self.ctx.storage.upsert_profile(&sender.to_profile()).await {
            warn!(user_id = sender.id, error = %e, "profile refresh failed");
        }
        if event.kind == InboundKind::Message {
            let text = event.text.as_deref().unwrap_or_default();
            if let Err(e) = self
                .ctx
                .storage
                .log_message(sender.id, text, event.sent_at)
                .await
            {
                warn!(user_id = sender.id, error = %e, "message log failed");
            }
        }

        match router::classify(event) {
            Route::Command { name, args } => {
                match self.commands.resolve(&name, user.is_admin()) {
                    Some(handler) => {
                        debug!(user_id = user.id, command = %name, "command");
                        handler.handle(&self.ctx, &mut user, event, &args).await
                    }
                    None => {
                        debug!(user_id = user.id, command = %name, "unknown command ignored");
                        Ok(())
                    }
                }
            }
            Route::FreeText => conversation::handle_free_text(&self.ctx, &mut user, event).await,
            Route::Callback(_) => callbacks::handle_callback(&self.ctx, &mut user, event).await,
            Route::ChannelPost => Ok(()),
        }
    }
}
