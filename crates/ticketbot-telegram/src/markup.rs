// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound conversion: keyboards, entities and membership answers.

use teloxide::types::{
    ChatMemberStatus, InlineKeyboardButton, InlineKeyboardMarkup, MessageEntity,
};
use ticketbot_core::TicketbotError;
use ticketbot_core::types::{ButtonAction, Keyboard, MembershipStatus, TextEntity};
use tracing::warn;

/// Builds the inline keyboard. Fails on a URL button with an unparseable
/// link.
pub fn inline_keyboard(keyboard: &Keyboard) -> Result<InlineKeyboardMarkup, TicketbotError> {
    let mut rows = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            let built = match &button.action {
                ButtonAction::Callback(data) => {
                    InlineKeyboardButton::callback(button.label.clone(), data.clone())
                }
                ButtonAction::Url(link) => {
                    let url = reqwest::Url::parse(link)
                        .map_err(|_| TicketbotError::malformed("button url", link.clone()))?;
                    InlineKeyboardButton::url(button.label.clone(), url)
                }
            };
            buttons.push(built);
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

/// Converts stored entities back into Telegram's typed form. Entities the
/// Bot API would reject are dropped so the text still goes out.
pub fn message_entities(entities: &[TextEntity]) -> Vec<MessageEntity> {
    entities
        .iter()
        .filter_map(|entity| {
            let converted = serde_json::to_value(entity).and_then(serde_json::from_value);
            match converted {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(kind = %entity.kind, error = %e, "dropping invalid entity");
                    None
                }
            }
        })
        .collect()
}

pub fn membership(status: ChatMemberStatus) -> MembershipStatus {
    match status {
        ChatMemberStatus::Owner => MembershipStatus::Owner,
        ChatMemberStatus::Administrator => MembershipStatus::Administrator,
        ChatMemberStatus::Member => MembershipStatus::Member,
        ChatMemberStatus::Restricted => MembershipStatus::Restricted,
        ChatMemberStatus::Left => MembershipStatus::Left,
        ChatMemberStatus::Banned => MembershipStatus::Banned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;
    use ticketbot_core::types::Button;

    #[test]
    fn keyboard_keeps_layout_and_payloads() {
        let keyboard = Keyboard {
            rows: vec![
                vec![Button::callback("Going on 28.03.2025", "reservedate:1")],
                vec![
                    Button::callback("More", "more_info"),
                    Button::url("Channel", "https://t.me/jazz"),
                ],
            ],
        };
        let markup = inline_keyboard(&keyboard).unwrap();

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 2);
        let first = &markup.inline_keyboard[0][0];
        assert_eq!(first.text, "Going on 28.03.2025");
        assert!(matches!(
            &first.kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "reservedate:1"
        ));
        assert!(matches!(
            &markup.inline_keyboard[1][1].kind,
            InlineKeyboardButtonKind::Url(url) if url.as_str() == "https://t.me/jazz"
        ));
    }

    #[test]
    fn bad_url_is_rejected() {
        let keyboard = Keyboard::single_column([Button::url("Channel", "not a link")]);
        let err = inline_keyboard(&keyboard).unwrap_err();
        assert!(matches!(err, TicketbotError::Malformed { .. }));
    }

    #[test]
    fn entities_convert_and_invalid_ones_drop() {
        let mut link = TextEntity::new("text_link", 6, 4);
        link.url = Some("https://t.me/jazz".into());
        let entities = vec![
            TextEntity::new("bold", 0, 5),
            link,
            TextEntity::new("no_such_kind", 0, 1),
        ];
        let converted = message_entities(&entities);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].offset, 0);
        assert_eq!(converted[1].length, 4);
    }

    #[test]
    fn membership_statuses_map_one_to_one() {
        assert_eq!(membership(ChatMemberStatus::Member), MembershipStatus::Member);
        assert_eq!(membership(ChatMemberStatus::Owner), MembershipStatus::Owner);
        assert_eq!(membership(ChatMemberStatus::Left), MembershipStatus::Left);
        assert!(!membership(ChatMemberStatus::Banned).is_subscribed());
    }
}
