// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The admin asset menu.

use ticketbot_core::types::{Button, Keyboard, OutboundMessage, User};
use ticketbot_core::{AssetKind, ConversationState, TicketbotError};

use crate::content::literals;
use crate::context::BotContext;
use crate::format::update_payload;

/// An editable content entry as shown in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub label: &'static str,
    pub literal: &'static str,
}

/// Every asset an admin can edit, in menu order.
pub const ASSETS: &[Asset] = &[
    Asset { label: "Start image", literal: literals::PREVIEW_IMAGE },
    Asset { label: "Welcome text", literal: literals::START },
    Asset { label: "Ticket button", literal: literals::LEAVE_TICKET_BUTTON },
    Asset { label: "Support chat ID", literal: literals::SUPPORT_CHAT_ID },
    Asset { label: "Channel ID", literal: literals::CHANNEL_ID },
    Asset { label: "Ticket sent notice", literal: literals::SENDED_NOTIFY },
    Asset { label: "Ticket prompt", literal: literals::LEAVETICKET_MESSAGE },
    Asset { label: "Subscribe prompt", literal: literals::SUBSCRIBE_MESSAGE },
    Asset { label: "Channel link", literal: literals::CHANNEL_LINK },
    Asset { label: "More info button", literal: literals::MORE_INFO },
    Asset { label: "Event info text", literal: literals::MORE_INFO_TEXT },
    Asset { label: "Pre-event reminder", literal: literals::NOTIFY_PRE_EVENT },
    Asset { label: "Reserved message", literal: literals::RESERVED_MESSAGE },
    Asset { label: "Sold out message", literal: literals::SOLDOUT_MESSAGE },
    Asset { label: "Already booked message", literal: literals::ALREADY_BOOKED_MESSAGE },
    Asset { label: "Payment request", literal: literals::ASK_TO_PAY },
    Asset { label: "Paid button", literal: literals::PAID_BUTTON },
    Asset { label: "After payment message", literal: literals::POST_PAYMENT_MESSAGE },
];

pub const PANEL_PROMPT: &str = "Choose an item to edit";
pub const PREVIEW_RESTORED: &str = "You were in user mode, switched back to admin mode...";
pub const ASSET_INSTRUCTIONS: &str = "Send me asset (text or picture (NOT as file)).\nSay `unset` to delete image.\nSay /start to cancel action";

/// Which kind of value a literal takes.
pub fn asset_kind(literal: &str) -> AssetKind {
    if literal == literals::PREVIEW_IMAGE {
        AssetKind::Image
    } else {
        AssetKind::Text
    }
}

pub fn panel_keyboard() -> Keyboard {
    Keyboard::single_column(
        ASSETS
            .iter()
            .map(|a| Button::callback(a.label, update_payload(a.literal))),
    )
}

/// Shows the asset menu to an admin, leaving preview mode first if needed.
/// Regular users get nothing.
pub async fn open_panel(ctx: &BotContext, user: &mut User) -> Result<(), TicketbotError> {
    if !user.is_admin() {
        return Ok(());
    }
    if ctx.identity.ensure_effective_admin(user).await? {
        ctx.send_text(user.id, PREVIEW_RESTORED).await?;
    }
    ctx.send(OutboundMessage::text(user.id, PANEL_PROMPT).with_keyboard(panel_keyboard()))
        .await?;
    Ok(())
}

/// Puts an effective admin into the editing state for `literal`.
pub async fn begin_edit(
    ctx: &BotContext,
    user: &mut User,
    literal: &str,
) -> Result<(), TicketbotError> {
    if literal.is_empty() {
        return Err(TicketbotError::malformed("asset literal", literal));
    }
    let state = ConversationState::AwaitingContentValue {
        kind: asset_kind(literal),
        literal: literal.to_string(),
    };
    ctx.identity.set_state(user, state).await?;
    ctx.send_text(user.id, ASSET_INSTRUCTIONS).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn literals_are_unique() {
        let set: HashSet<_> = ASSETS.iter().map(|a| a.literal).collect();
        assert_eq!(set.len(), ASSETS.len());
    }

    #[test]
    fn keyboard_has_one_update_button_per_asset() {
        let kb = panel_keyboard();
        let payloads = kb.callback_payloads();
        assert_eq!(payloads.len(), ASSETS.len());
        assert_eq!(payloads[0], "update:preview_image");
        assert!(payloads.iter().all(|p| p.starts_with("update:")));
    }

    #[test]
    fn only_the_preview_image_is_an_image() {
        assert_eq!(asset_kind("preview_image"), AssetKind::Image);
        assert_eq!(asset_kind("start"), AssetKind::Text);
        assert_eq!(asset_kind("custom"), AssetKind::Text);
    }
}
