// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for Ticketbot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for private messages, button presses and channel posts,
//! plus text/photo delivery with inline keyboards.

pub mod handler;
pub mod markup;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, FileId, InputFile, Recipient};
use ticketbot_config::model::TelegramConfig;
use ticketbot_core::TicketbotError;
use ticketbot_core::traits::{ChannelAdapter, PluginAdapter};
use ticketbot_core::types::{
    AdapterType, HealthStatus, InboundEvent, MembershipStatus, MessageId, OutboundContent,
    OutboundMessage,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the buffer between the poller and `receive()`.
const INBOUND_BUFFER: usize = 100;

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, TicketbotError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            TicketbotError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.trim().is_empty() {
            return Err(TicketbotError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: Mutex::new(None),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn transport(what: &str) -> impl FnOnce(teloxide::RequestError) -> TicketbotError + '_ {
    move |e| TicketbotError::transport(format!("failed to {what}: {e}"), e)
}

fn telegram_message_id(id: &MessageId) -> Result<teloxide::types::MessageId, TicketbotError> {
    id.0.parse::<i32>()
        .map(teloxide::types::MessageId)
        .map_err(|_| TicketbotError::malformed("telegram message id", id.0.clone()))
}

async fn forward(tx: &mpsc::Sender<InboundEvent>, event: InboundEvent) {
    if tx.send(event).await.is_err() {
        warn!("inbound channel closed, dropping update");
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TicketbotError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), TicketbotError> {
        if let Some(handle) = self.polling_handle.lock().await.take() {
            debug!("stopping Telegram long polling");
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), TicketbotError> {
        let mut polling = self.polling_handle.lock().await;
        if polling.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();
        let post_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        match handler::message_to_event(&msg) {
                            Some(event) => forward(&tx, event).await,
                            None => debug!(msg_id = msg.id.0, "message ignored"),
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |query: CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            forward(&tx, handler::callback_to_event(&query)).await;
                            respond(())
                        }
                    },
                ))
                .branch(Update::filter_channel_post().endpoint(move |msg: Message| {
                    let tx = post_tx.clone();
                    async move {
                        forward(&tx, handler::channel_post_to_event(&msg)).await;
                        respond(())
                    }
                }));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        *polling = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, TicketbotError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| TicketbotError::Transport {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TicketbotError> {
        let chat = Recipient::Id(ChatId(msg.chat_id));
        let markup = msg.keyboard.as_ref().map(markup::inline_keyboard).transpose()?;
        let entities = markup::message_entities(&msg.entities);

        let sent = match msg.content {
            OutboundContent::Text(text) => {
                let mut request = self.bot.send_message(chat, text);
                if !entities.is_empty() {
                    request = request.entities(entities);
                }
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await.map_err(transport("send message"))?
            }
            OutboundContent::Photo { file_ref, caption } => {
                let mut request = self
                    .bot
                    .send_photo(chat, InputFile::file_id(FileId(file_ref)));
                if !caption.is_empty() {
                    request = request.caption(caption);
                }
                if !entities.is_empty() {
                    request = request.caption_entities(entities);
                }
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await.map_err(transport("send photo"))?
            }
        };

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn delete_message(
        &self,
        chat_id: i64,
        message_id: &MessageId,
    ) -> Result<(), TicketbotError> {
        self.bot
            .delete_message(ChatId(chat_id), telegram_message_id(message_id)?)
            .await
            .map_err(transport("delete message"))?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TicketbotError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await
            .map_err(transport("answer callback"))?;
        Ok(())
    }

    async fn chat_membership(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<MembershipStatus, TicketbotError> {
        let user_id = u64::try_from(user_id)
            .map_err(|_| TicketbotError::malformed("telegram user id", user_id.to_string()))?;
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await
            .map_err(transport("get chat member"))?;
        Ok(markup::membership(member.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(&config(None)).is_err());
    }

    #[test]
    fn new_rejects_blank_token() {
        assert!(TelegramChannel::new(&config(Some(""))).is_err());
        assert!(TelegramChannel::new(&config(Some("   "))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramChannel::new(&config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"))).is_ok());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[test]
    fn message_ids_must_be_numeric() {
        assert_eq!(
            telegram_message_id(&MessageId("42".into())).unwrap(),
            teloxide::types::MessageId(42)
        );
        assert!(telegram_message_id(&MessageId("mock-msg-1".into())).is_err());
    }

    #[tokio::test]
    async fn receive_fails_once_senders_are_gone() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        let event = InboundEvent::channel_post(-1, MessageId("1".into()), "hi");
        channel.inbound_tx.send(event.clone()).await.unwrap();
        assert_eq!(channel.receive().await.unwrap(), event);

        let TelegramChannel {
            inbound_rx,
            inbound_tx,
            ..
        } = channel;
        drop(inbound_tx);
        let err = inbound_rx.lock().await.recv().await;
        assert!(err.is_none());
    }
}
