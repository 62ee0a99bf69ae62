// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands and the registry that dispatches them.
//!
//! The registry holds two tables. Admins are looked up in the admin table
//! first, so an admin entry shadows a public one with the same name.
//! Unknown commands resolve to nothing and are ignored by the router.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ticketbot_core::types::{Button, InboundEvent, Keyboard, OutboundMessage, User};
use ticketbot_core::{ConversationState, TicketbotError};
use tracing::{debug, info, warn};

use crate::content::literals;
use crate::context::BotContext;
use crate::format::{date_button_label, reserve_date_payload};
use crate::panel::open_panel;

/// A slash command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name without the leading slash.
    fn name(&self) -> &str;

    /// Runs the command. `args` is the trimmed text after the command name.
    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        event: &InboundEvent,
        args: &str,
    ) -> Result<(), TicketbotError>;
}

/// Splits `/name@bot rest` into `("name", "rest")`.
///
/// Returns `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('/')?;
    let (head, args) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (body, ""),
    };
    let name = head.split_once('@').map_or(head, |(name, _)| name);
    Some((name, args))
}

/// Command tables, built once at startup.
#[derive(Default)]
pub struct CommandRegistry {
    public: HashMap<String, Arc<dyn CommandHandler>>,
    admin: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock command set.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let secret: Arc<dyn CommandHandler> = Arc::new(SecretCommand);

        registry.register_public(Arc::new(StartCommand));
        registry.register_public(secret.clone());

        registry.register_admin(secret);
        registry.register_admin(Arc::new(PanelCommand));
        registry.register_admin(Arc::new(UserModeCommand));
        registry.register_admin(Arc::new(DeopCommand));
        registry.register_admin(Arc::new(IdCommand));
        registry.register_admin(Arc::new(SetChannelIdCommand));
        registry.register_admin(Arc::new(BroadcastCommand));
        registry
    }

    pub fn register_public(&mut self, handler: Arc<dyn CommandHandler>) {
        self.public.insert(handler.name().to_string(), handler);
    }

    pub fn register_admin(&mut self, handler: Arc<dyn CommandHandler>) {
        self.admin.insert(handler.name().to_string(), handler);
    }

    /// Finds the handler for `name`, consulting the admin table first when
    /// `is_admin` is set.
    pub fn resolve(&self, name: &str, is_admin: bool) -> Option<Arc<dyn CommandHandler>> {
        if is_admin && let Some(handler) = self.admin.get(name) {
            return Some(handler.clone());
        }
        self.public.get(name).cloned()
    }

    /// Sorted names of the public and admin tables.
    pub fn names(&self) -> (Vec<&str>, Vec<&str>) {
        let mut public: Vec<&str> = self.public.keys().map(String::as_str).collect();
        let mut admin: Vec<&str> = self.admin.keys().map(String::as_str).collect();
        public.sort_unstable();
        admin.sort_unstable();
        (public, admin)
    }
}

// --- Public commands ---

/// `/start`: back to the main menu with the date picker.
pub struct StartCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    fn name(&self) -> &str {
        "start"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        event: &InboundEvent,
        _args: &str,
    ) -> Result<(), TicketbotError> {
        ctx.identity.set_state(user, ConversationState::Idle).await?;
        let keyboard = start_keyboard(ctx).await?;

        let text = ctx.content.text(literals::START).await;
        let entities = ctx.content.entities(literals::START).await;
        let msg = match ctx.content.non_empty(literals::PREVIEW_IMAGE).await {
            Some(file_ref) => OutboundMessage::photo(event.chat_id, file_ref, text),
            None => OutboundMessage::text(event.chat_id, text),
        };
        ctx.send(msg.with_entities(entities).with_keyboard(keyboard))
            .await?;
        Ok(())
    }
}

/// One button per upcoming event, then "more info" and "leave a ticket".
pub async fn start_keyboard(ctx: &BotContext) -> Result<Keyboard, TicketbotError> {
    let offset = ctx.local_offset();
    let mut buttons: Vec<Button> = ctx
        .ledger
        .upcoming_events(Utc::now())
        .await?
        .iter()
        .map(|e| Button::callback(date_button_label(e.date, offset), reserve_date_payload(e)))
        .collect();
    buttons.push(Button::callback(
        ctx.content.text(literals::MORE_INFO).await,
        "more_info",
    ));
    buttons.push(Button::callback(
        ctx.content.text(literals::LEAVE_TICKET_BUTTON).await,
        "leave_ticket",
    ));
    Ok(Keyboard::single_column(buttons))
}

/// `/secret <password>`: become an admin.
pub struct SecretCommand;

#[async_trait]
impl CommandHandler for SecretCommand {
    fn name(&self) -> &str {
        "secret"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        event: &InboundEvent,
        args: &str,
    ) -> Result<(), TicketbotError> {
        let password_matches = ctx
            .config
            .admin
            .password
            .as_deref()
            .is_some_and(|p| p == args);
        if !password_matches && !user.is_admin() {
            debug!(user_id = user.id, "rejected admin password");
            return Ok(());
        }
        ctx.identity.grant_admin(user).await?;
        info!(user_id = user.id, "admin rights granted");
        ctx.send_text(event.chat_id, "You are admin now!").await?;
        Ok(())
    }
}

// --- Admin commands ---

pub struct PanelCommand;

#[async_trait]
impl CommandHandler for PanelCommand {
    fn name(&self) -> &str {
        "panel"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        _event: &InboundEvent,
        _args: &str,
    ) -> Result<(), TicketbotError> {
        open_panel(ctx, user).await
    }
}

/// `/usermode`: see the bot as a regular user until the panel is opened.
pub struct UserModeCommand;

#[async_trait]
impl CommandHandler for UserModeCommand {
    fn name(&self) -> &str {
        "usermode"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        event: &InboundEvent,
        _args: &str,
    ) -> Result<(), TicketbotError> {
        ctx.identity.enter_preview(user).await?;
        ctx.send_text(event.chat_id, "Simulating user experience!")
            .await?;
        Ok(())
    }
}

pub struct DeopCommand;

#[async_trait]
impl CommandHandler for DeopCommand {
    fn name(&self) -> &str {
        "deop"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        event: &InboundEvent,
        _args: &str,
    ) -> Result<(), TicketbotError> {
        ctx.identity.revoke(user).await?;
        ctx.send_text(event.chat_id, "DeOPed you!").await?;
        Ok(())
    }
}

/// `/id`: echo the chat id.
pub struct IdCommand;

#[async_trait]
impl CommandHandler for IdCommand {
    fn name(&self) -> &str {
        "id"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        _user: &mut User,
        event: &InboundEvent,
        _args: &str,
    ) -> Result<(), TicketbotError> {
        ctx.send_text(event.chat_id, event.chat_id.to_string())
            .await?;
        Ok(())
    }
}

pub const SET_CHANNEL_ID_HELP: &str = "Add the bot as an admin of your channel, then post `setchannelid` there. The post is deleted and the channel is linked.";

pub struct SetChannelIdCommand;

#[async_trait]
impl CommandHandler for SetChannelIdCommand {
    fn name(&self) -> &str {
        "setchannelid"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        _user: &mut User,
        event: &InboundEvent,
        _args: &str,
    ) -> Result<(), TicketbotError> {
        ctx.send_text(event.chat_id, SET_CHANNEL_ID_HELP).await?;
        Ok(())
    }
}

/// `/broadcast <text>`: fire-and-forget delivery to every known user.
pub struct BroadcastCommand;

#[async_trait]
impl CommandHandler for BroadcastCommand {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn handle(
        &self,
        ctx: &BotContext,
        user: &mut User,
        event: &InboundEvent,
        args: &str,
    ) -> Result<(), TicketbotError> {
        if args.is_empty() {
            ctx.send_text(event.chat_id, "Usage: /broadcast <text>")
                .await?;
            return Ok(());
        }

        let recipients = ctx.storage.list_user_ids().await?;
        info!(
            user_id = user.id,
            recipients = recipients.len(),
            "broadcast started"
        );
        for &recipient in &recipients {
            let ctx = ctx.clone();
            let msg = OutboundMessage::text(recipient, args);
            tokio::spawn(async move {
                if let Err(e) = ctx.send(msg).await {
                    warn!(recipient, error = %e, "broadcast delivery failed");
                }
            });
        }
        ctx.send_text(
            event.chat_id,
            format!("Broadcasting to {} users", recipients.len()),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_command() {
        assert_eq!(parse_command("/start"), Some(("start", "")));
    }

    #[test]
    fn parse_strips_bot_suffix_and_keeps_args() {
        assert_eq!(
            parse_command("/secret@ticket_bot   hunter2 "),
            Some(("secret", "hunter2"))
        );
        assert_eq!(
            parse_command("/broadcast hello\nworld"),
            Some(("broadcast", "hello\nworld"))
        );
    }

    #[test]
    fn parse_rejects_non_commands() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn standard_tables() {
        let registry = CommandRegistry::standard();
        let (public, admin) = registry.names();
        assert_eq!(public, vec!["secret", "start"]);
        assert_eq!(
            admin,
            vec!["broadcast", "deop", "id", "panel", "secret", "setchannelid", "usermode"]
        );
    }

    #[test]
    fn admin_commands_are_hidden_from_regular_users() {
        let registry = CommandRegistry::standard();
        assert!(registry.resolve("panel", false).is_none());
        assert!(registry.resolve("panel", true).is_some());
        assert!(registry.resolve("start", true).is_some());
        assert!(registry.resolve("nope", true).is_none());
    }

    struct Named(&'static str);

    #[async_trait]
    impl CommandHandler for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn handle(
            &self,
            _ctx: &BotContext,
            _user: &mut User,
            _event: &InboundEvent,
            _args: &str,
        ) -> Result<(), TicketbotError> {
            Ok(())
        }
    }

    #[test]
    fn admin_entry_shadows_public_entry() {
        let mut registry = CommandRegistry::new();
        let public: Arc<dyn CommandHandler> = Arc::new(Named("help"));
        let admin: Arc<dyn CommandHandler> = Arc::new(Named("help"));
        registry.register_public(public.clone());
        registry.register_admin(admin.clone());

        let for_admin = registry.resolve("help", true).unwrap();
        let for_user = registry.resolve("help", false).unwrap();
        assert!(Arc::ptr_eq(&for_admin, &admin));
        assert!(Arc::ptr_eq(&for_user, &public));
    }
}
