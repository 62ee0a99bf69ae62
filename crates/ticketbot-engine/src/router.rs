// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of inbound events and parsing of callback payloads.

use ticketbot_core::TicketbotError;
use ticketbot_core::types::{InboundEvent, InboundKind};

use crate::commands::parse_command;
use crate::format::{PAID_PREFIX, RESERVE_DATE_PREFIX, UPDATE_PREFIX};

/// What an inbound event is, as far as dispatch is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command { name: String, args: String },
    FreeText,
    Callback(String),
    ChannelPost,
}

pub fn classify(event: &InboundEvent) -> Route {
    match event.kind {
        InboundKind::ChannelPost => Route::ChannelPost,
        InboundKind::Callback => {
            Route::Callback(event.callback_data.clone().unwrap_or_default())
        }
        InboundKind::Message => match event.text.as_deref().and_then(parse_command) {
            Some((name, args)) => Route::Command {
                name: name.to_string(),
                args: args.to_string(),
            },
            None => Route::FreeText,
        },
    }
}

/// A parsed button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    MoreInfo,
    Panel,
    LeaveTicket,
    /// `paidcallback:<reservation id>`
    ConfirmPaid(i64),
    /// `reservedate:<event id>`
    ReserveDate(i64),
    /// `update:<literal>`
    EditAsset(String),
    /// Anything else; only effective admins get to see these.
    Other(String),
}

impl CallbackAction {
    /// Parses a payload. A known prefix with an unreadable argument is
    /// `Malformed`.
    pub fn parse(data: &str) -> Result<Self, TicketbotError> {
        match data {
            "more_info" => return Ok(Self::MoreInfo),
            "panel" => return Ok(Self::Panel),
            "leave_ticket" => return Ok(Self::LeaveTicket),
            _ => {}
        }

        let Some((prefix, arg)) = data.split_once(':') else {
            return Ok(Self::Other(data.to_string()));
        };
        let id = |what| {
            arg.parse::<i64>()
                .map_err(|_| TicketbotError::malformed(what, data))
        };
        match prefix {
            PAID_PREFIX => id("paid callback").map(Self::ConfirmPaid),
            RESERVE_DATE_PREFIX => id("date callback").map(Self::ReserveDate),
            UPDATE_PREFIX if !arg.is_empty() => Ok(Self::EditAsset(arg.to_string())),
            UPDATE_PREFIX => Err(TicketbotError::malformed("update callback", data)),
            _ => Ok(Self::Other(data.to_string())),
        }
    }
}
