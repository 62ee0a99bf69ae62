// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline button flows: date selection, payment confirmation, support
//! tickets, and the admin asset editor.

use ticketbot_core::types::{
    Button, InboundEvent, Keyboard, OutboundMessage, PaymentOutcome, TaskKind, User,
};
use ticketbot_core::{ConversationState, TicketbotError};
use tracing::{debug, info, warn};

use crate::content::literals;
use crate::context::BotContext;
use crate::conversation::SUPPORT_CHAT_UNSET;
use crate::format::paid_notice;
use crate::panel::{begin_edit, open_panel};
use crate::router::CallbackAction;

pub const CHANNEL_ID_UNSET: &str = "ChannelID is not set!!!";
pub const CHANNEL_LINK_UNSET: &str = "Channel link is not set!!!";
pub const CHANNEL_BUTTON: &str = "Channel";

/// Runs the flow for a button press, then acknowledges it whatever the
/// outcome.
pub async fn handle_callback(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
) -> Result<(), TicketbotError> {
    let data = event.callback_data.as_deref().unwrap_or_default();
    let result = match CallbackAction::parse(data) {
        Ok(action) => dispatch(ctx, user, event, action).await,
        Err(e) => {
            warn!(user_id = user.id, error = %e, "ignoring callback");
            Ok(())
        }
    };

    if let Some(callback_id) = &event.callback_id
        && let Err(e) = ctx.channel.answer_callback(callback_id).await
    {
        warn!(callback_id, error = %e, "failed to answer callback");
    }
    result
}

async fn dispatch(
    ctx: &BotContext,
    user: &mut User,
    event: &InboundEvent,
    action: CallbackAction,
) -> Result<(), TicketbotError> {
    match action {
        CallbackAction::MoreInfo => {
            ctx.send_content(event.chat_id, literals::MORE_INFO_TEXT, None)
                .await?;
            Ok(())
        }
        CallbackAction::ReserveDate(event_id) => reserve_date(ctx, user, event_id).await,
        CallbackAction::ConfirmPaid(reservation_id) => {
            confirm_paid(ctx, user, reservation_id).await
        }
        CallbackAction::LeaveTicket => leave_ticket_button(ctx, user).await,
        CallbackAction::Panel => open_panel(ctx, user).await,
        CallbackAction::EditAsset(literal) if user.is_effective_admin() => {
            begin_edit(ctx, user, &literal).await
        }
        CallbackAction::EditAsset(_) | CallbackAction::Other(_) => {
            debug!(
                user_id = user.id,
                effective_admin = user.is_effective_admin(),
                "callback dropped"
            );
            Ok(())
        }
    }
}

/// Books a seat and asks for the attendee name.
async fn reserve_date(ctx: &BotContext, user: &mut User, event_id: i64) -> Result<(), TicketbotError> {
    let reservation = match ctx.ledger.create_reservation(user.id, event_id).await {
        Ok(r) => r,
        Err(TicketbotError::CapacityExceeded { .. }) => {
            info!(user_id = user.id, event_id, "event sold out");
            ctx.send_content(user.id, literals::SOLDOUT_MESSAGE, None)
                .await?;
            return Ok(());
        }
        Err(TicketbotError::DuplicateReservation { .. }) => {
            ctx.send_content(user.id, literals::ALREADY_BOOKED_MESSAGE, None)
                .await?;
            return Ok(());
        }
        Err(TicketbotError::NotFound { .. }) => {
            warn!(user_id = user.id, event_id, "reservation for unknown event");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    ctx.identity
        .set_state(user, ConversationState::AwaitingReservationName(reservation.id))
        .await?;
    ctx.send_content(user.id, literals::RESERVED_MESSAGE, None)
        .await?;
    Ok(())
}

/// Marks the reservation paid. Only a real transition has effects; a
/// repeated press is silent.
async fn confirm_paid(
    ctx: &BotContext,
    user: &mut User,
    reservation_id: i64,
) -> Result<(), TicketbotError> {
    let reservation = match ctx.ledger.get(reservation_id).await {
        Ok(r) => r,
        Err(TicketbotError::NotFound { .. }) => {
            warn!(user_id = user.id, reservation_id, "payment for unknown reservation");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    if reservation.user_id != user.id {
        warn!(
            user_id = user.id,
            owner = reservation.user_id,
            reservation_id,
            "payment confirmation by non-owner ignored"
        );
        return Ok(());
    }

    let reservation = match ctx.ledger.mark_paid(reservation_id).await? {
        PaymentOutcome::Transitioned(r) => r,
        PaymentOutcome::AlreadyPaid(_) => {
            debug!(reservation_id, "already paid, nothing to do");
            return Ok(());
        }
    };

    notify_support_of_payment(ctx, reservation.user_id, reservation.event_id).await;
    ctx.send_content(user.id, literals::POST_PAYMENT_MESSAGE, None)
        .await?;
    ctx.storage
        .schedule_task(TaskKind::SyncSheet, Some(reservation.event_id))
        .await?;
    if user.state.awaited_reservation() == Some(reservation_id) {
        ctx.identity
            .set_state(user, ConversationState::Idle)
            .await?;
    }
    Ok(())
}

async fn notify_support_of_payment(ctx: &BotContext, user_id: i64, event_id: i64) {
    let support_chat = match ctx.content.chat_id(literals::SUPPORT_CHAT_ID).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "support chat is not configured");
            ctx.alert_admins(SUPPORT_CHAT_UNSET).await;
            0
        }
    };
    let profile = match ctx.storage.get_profile(user_id).await {
        Ok(profile) => profile.unwrap_or_default(),
        Err(e) => {
            warn!(user_id, error = %e, "profile lookup failed");
            Default::default()
        }
    };
    let event = match ctx.ledger.event(event_id).await {
        Ok(event) => event,
        Err(e) => {
            warn!(event_id, error = %e, "event lookup failed, payment notice dropped");
            return;
        }
    };
    let notice = paid_notice(&profile, event.date, ctx.local_offset());
    ctx.deliver(OutboundMessage::text(support_chat, notice)).await;
}

/// Opens the ticket prompt for channel subscribers, otherwise asks the user
/// to subscribe first.
async fn leave_ticket_button(ctx: &BotContext, user: &mut User) -> Result<(), TicketbotError> {
    let subscribed = match ctx.content.chat_id(literals::CHANNEL_ID).await {
        Ok(channel_id) => match ctx.channel.chat_membership(channel_id, user.id).await {
            Ok(status) => status.is_subscribed(),
            Err(e) => {
                warn!(user_id = user.id, channel_id, error = %e, "membership lookup failed");
                false
            }
        },
        Err(e) => {
            warn!(error = %e, "channel is not configured");
            ctx.alert_admins(CHANNEL_ID_UNSET).await;
            false
        }
    };

    if subscribed {
        ctx.identity
            .set_state(user, ConversationState::AwaitingTicketText)
            .await?;
        ctx.send_content(user.id, literals::LEAVETICKET_MESSAGE, None)
            .await?;
        return Ok(());
    }

    let keyboard = match ctx.content.non_empty(literals::CHANNEL_LINK).await {
        Some(link) => Some(Keyboard::single_column([Button::url(CHANNEL_BUTTON, link)])),
        None => {
            ctx.alert_admins(CHANNEL_LINK_UNSET).await;
            None
        }
    };
    ctx.send_content(user.id, literals::SUBSCRIBE_MESSAGE, keyboard)
        .await?;
    Ok(())
}
