// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound conversion: Telegram updates into channel-agnostic
//! [`InboundEvent`]s.
//!
//! Only private-chat messages, button presses and channel posts reach the
//! engine. Group traffic is dropped here.

use teloxide::types::{CallbackQuery, ChatKind, Message, MessageEntity, PhotoSize, User};
use ticketbot_core::types::{
    InboundEvent, InboundKind, MessageId, PhotoVariant, Sender, TextEntity,
};
use tracing::{debug, warn};

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn sender_from_user(user: &User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// Converts Telegram entities into the stored Bot API shape.
///
/// Entity kinds that do not fit (e.g. mentions carrying a user object) are
/// skipped.
pub fn text_entities(entities: &[MessageEntity]) -> Vec<TextEntity> {
    entities
        .iter()
        .filter_map(|entity| {
            let converted = serde_json::to_value(entity).and_then(serde_json::from_value);
            match converted {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(error = %e, "skipping unconvertible message entity");
                    None
                }
            }
        })
        .collect()
}

pub fn photo_variants(photos: &[PhotoSize]) -> Vec<PhotoVariant> {
    photos
        .iter()
        .map(|p| PhotoVariant {
            file_id: p.file.id.to_string(),
            size: u64::from(p.file.size),
        })
        .collect()
}

/// A private-chat message. Returns `None` for group chats and messages
/// without an author.
pub fn message_to_event(msg: &Message) -> Option<InboundEvent> {
    if !is_dm(msg) {
        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
        return None;
    }
    let sender = sender_from_user(msg.from.as_ref()?);

    let (text, entities) = match (msg.text(), msg.caption()) {
        (Some(text), _) => (Some(text), msg.entities()),
        (None, Some(caption)) => (Some(caption), msg.caption_entities()),
        (None, None) => (None, None),
    };

    Some(InboundEvent {
        kind: InboundKind::Message,
        sender: Some(sender),
        chat_id: msg.chat.id.0,
        message_id: Some(MessageId(msg.id.0.to_string())),
        text: text.map(str::to_string),
        entities: entities.map(text_entities).unwrap_or_default(),
        photo_variants: msg.photo().map(photo_variants).unwrap_or_default(),
        callback_id: None,
        callback_data: None,
        sent_at: msg.date,
    })
}

/// A button press. Presses come from keyboards in the presser's private
/// chat, so replies go to the presser.
pub fn callback_to_event(query: &CallbackQuery) -> InboundEvent {
    let mut event = InboundEvent::callback(
        sender_from_user(&query.from),
        query.data.clone().unwrap_or_default(),
    );
    event.callback_id = Some(query.id.0.clone());
    event
}

pub fn channel_post_to_event(msg: &Message) -> InboundEvent {
    let mut event = InboundEvent::channel_post(
        msg.chat.id.0,
        MessageId(msg.id.0.to_string()),
        msg.text().unwrap_or_default(),
    );
    event.sent_at = msg.date;
    event
}
