// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text handling: what a plain message means in each conversation state.

use chrono::Utc;
use ticketbot_core::types::{Button, InboundEvent, Keyboard, User};
use ticketbot_core::{AssetKind, ConversationState, TicketbotError};
use tracing::{debug, info, warn};

use crate::content::{literals, serialize_entities};
use crate::context::BotContext;
use crate::format::{paid_payload, support_ticket};

pub const TRY_AGAIN: &str = "Something went wrong, try again...";
pub const SUPPORT_CHAT_UNSET: &str = "Support ChatID is not set!!!";
pub const IMAGE_SET: &str = "Successfully set new image!";
pub const IMAGE_UNSET: &str = "Image removed.";
pub const TEXT_SET: &str = "Successfully set new text!";
pub const SEND_PHOTO: &str = "Send a picture (not as a file), or say `unset`.";
pub const SEND_TEXT: &str = "Send the new text.";

/// The word that clears an image asset.
const UNSET: &str = "unset";

/// Interprets a non-command message according to `user.state`.
pub async fn handle_free_text(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
) -> Result<(), TicketbotError> {
    match user.state.clone() {
        ConversationState::AwaitingTicketText => leave_ticket(ctx, user, event).await,
        ConversationState::AwaitingReservationName(id) => {
            enter_reservation_name(ctx, user, event, id).await
        }
        ConversationState::AwaitingContentValue { kind, literal } => {
            if !user.is_effective_admin() {
                debug!(user_id = user.id, literal, "content edit ignored outside admin mode");
                return Ok(());
            }
            match kind {
                AssetKind::Image => set_image(ctx, user, event, &literal).await,
                AssetKind::Text => set_text(ctx, user, event, &literal).await,
            }
        }
        ConversationState::Idle => Ok(()),
    }
}

/// Forwards the message to the support chat as a ticket.
async fn leave_ticket(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
) -> Result<(), TicketbotError> {
    let text = event.text.as_deref().unwrap_or_default();
    let profile = match &event.sender {
        Some(sender) => sender.to_profile(),
        None => ctx.storage.get_profile(user.id).await?.unwrap_or_default(),
    };
    let ticket = support_ticket(&profile, text);

    let support_chat = match ctx.content.chat_id(literals::SUPPORT_CHAT_ID).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "support chat is not configured");
            ctx.alert_admins(SUPPORT_CHAT_UNSET).await;
            0
        }
    };

    if let Err(e) = ctx.send_text(support_chat, ticket).await {
        warn!(user_id = user.id, error = %e, "ticket delivery failed");
        ctx.send_text(event.chat_id, TRY_AGAIN).await?;
        return Ok(());
    }

    info!(user_id = user.id, "support ticket forwarded");
    ctx.identity
        .set_state(user, ConversationState::Idle)
        .await?;
    ctx.send_content(event.chat_id, literals::SENDED_NOTIFY, None)
        .await?;
    Ok(())
}

/// Records the attendee name and asks for payment. The state is kept so a
/// corrected name can be sent before paying.
async fn enter_reservation_name(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
    reservation_id: i64,
) -> Result<(), TicketbotError> {
    let Some(name) = event.text.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
        debug!(user_id = user.id, "no name in message");
        return Ok(());
    };

    match ctx.ledger.record_name(reservation_id, name, Utc::now()).await {
        Ok(_) => {}
        Err(e) if e.is_business_rule() => {
            warn!(user_id = user.id, reservation_id, error = %e, "name not recorded");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    let button = Button::callback(
        ctx.content.text(literals::PAID_BUTTON).await,
        paid_payload(reservation_id),
    );
    ctx.send_content(
        event.chat_id,
        literals::ASK_TO_PAY,
        Some(Keyboard::single_column([button])),
    )
    .await?;
    Ok(())
}

async fn set_image(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
    literal: &str,
) -> Result<(), TicketbotError> {
    let reply = if event.text.as_deref().map(str::trim) == Some(UNSET) {
        ctx.content.set(literal, "", "").await?;
        IMAGE_UNSET
    } else if let Some(photo) = event.largest_photo() {
        ctx.content.set(literal, &photo.file_id, "").await?;
        IMAGE_SET
    } else {
        ctx.send_text(event.chat_id, SEND_PHOTO).await?;
        return Ok(());
    };

    ctx.identity
        .set_state(user, ConversationState::Idle)
        .await?;
    ctx.send_text(event.chat_id, reply).await?;
    Ok(())
}

async fn set_text(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
    literal: &str,
) -> Result<(), TicketbotError> {
    let Some(text) = event.text.as_deref() else {
        ctx.send_text(event.chat_id, SEND_TEXT).await?;
        return Ok(());
    };

    ctx.content
        .set(literal, text, &serialize_entities(&event.entities))
        .await?;
    ctx.identity
        .set_state(user, ConversationState::Idle)
        .await?;
    ctx.send_text(event.chat_id, TEXT_SET).await?;
    Ok(())
}

/// The text a channel admin posts to link the channel.
pub const SET_CHANNEL_ID_TRIGGER: &str = "setchannelid";

/// Binds the channel where `setchannelid` was posted, then removes the post.
pub async fn handle_channel_post(
    ctx: &BotContext,
    event: &InboundEvent,
) -> Result<(), TicketbotError> {
    if event.text.as_deref().map(str::trim) != Some(SET_CHANNEL_ID_TRIGGER) {
        return Ok(());
    }

    let channel_id = event.chat_id;
    ctx.content
        .set(literals::CHANNEL_ID, &channel_id.to_string(), "")
        .await?;
    info!(channel_id, "channel linked");
    ctx.alert_admins(&format!("ChannelID is set to {channel_id}"))
        .await;

    if let Some(message_id) = &event.message_id
        && let Err(e) = ctx.channel.delete_message(channel_id, message_id).await
    {
        warn!(channel_id, error = %e, "failed to delete setchannelid post");
    }
    Ok(())
}
