// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state and its persisted token form.
//!
//! A user's position in a conversation is stored as a short text token:
//! `start`, `leaveticket`, `enternamereservation:<id>`, `imgset:<literal>`
//! or `stringset:<literal>`. The token splits on the first `:` only, so
//! literals may themselves contain colons.

use std::fmt;

use strum::{Display, EnumString};

use crate::error::TicketbotError;

/// What kind of value an admin is about to upload for a content literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum AssetKind {
    #[strum(serialize = "imgset")]
    Image,
    #[strum(serialize = "stringset")]
    Text,
}

/// Where a user currently is in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ConversationState {
    /// Main menu. Also the fallback for unreadable tokens.
    #[default]
    Idle,
    /// The next free-text message becomes a support ticket.
    AwaitingTicketText,
    /// The next free-text message is the attendee name for this reservation.
    AwaitingReservationName(i64),
    /// An admin is editing the content entry `literal`.
    AwaitingContentValue { kind: AssetKind, literal: String },
}

const IDLE: &str = "start";
const TICKET: &str = "leaveticket";
const RESERVATION_NAME: &str = "enternamereservation";

impl ConversationState {
    /// Encodes the state into its persisted token.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Strict decode. Unknown prefixes and bad arguments are errors.
    pub fn parse(token: &str) -> Result<Self, TicketbotError> {
        let (head, arg) = match token.split_once(':') {
            Some((head, arg)) => (head, Some(arg)),
            None => (token, None),
        };

        match (head, arg) {
            (IDLE, None) => Ok(Self::Idle),
            (TICKET, None) => Ok(Self::AwaitingTicketText),
            (RESERVATION_NAME, Some(id)) => id
                .parse::<i64>()
                .map(Self::AwaitingReservationName)
                .map_err(|_| TicketbotError::malformed("state token", token)),
            (head, Some(literal)) if !literal.is_empty() => match head.parse::<AssetKind>() {
                Ok(kind) => Ok(Self::AwaitingContentValue {
                    kind,
                    literal: literal.to_string(),
                }),
                Err(_) => Err(TicketbotError::malformed("state token", token)),
            },
            _ => Err(TicketbotError::malformed("state token", token)),
        }
    }

    /// Lenient decode used when loading users: anything unreadable is `Idle`.
    pub fn decode(token: &str) -> Self {
        Self::parse(token).unwrap_or_else(|e| {
            tracing::warn!(token, error = %e, "unreadable state token, falling back to start");
            Self::Idle
        })
    }

    /// The reservation whose name is awaited, if any.
    pub fn awaited_reservation(&self) -> Option<i64> {
        match self {
            Self::AwaitingReservationName(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str(IDLE),
            Self::AwaitingTicketText => f.write_str(TICKET),
            Self::AwaitingReservationName(id) => write!(f, "{RESERVATION_NAME}:{id}"),
            Self::AwaitingContentValue { kind, literal } => write!(f, "{kind}:{literal}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_known_tokens() {
        assert_eq!(ConversationState::Idle.encode(), "start");
        assert_eq!(ConversationState::AwaitingTicketText.encode(), "leaveticket");
        assert_eq!(
            ConversationState::AwaitingReservationName(42).encode(),
            "enternamereservation:42"
        );
        assert_eq!(
            ConversationState::AwaitingContentValue {
                kind: AssetKind::Image,
                literal: "preview_image".into()
            }
            .encode(),
            "imgset:preview_image"
        );
        assert_eq!(
            ConversationState::AwaitingContentValue {
                kind: AssetKind::Text,
                literal: "start".into()
            }
            .encode(),
            "stringset:start"
        );
    }

    #[test]
    fn literal_keeps_colons_after_first_split() {
        let state = ConversationState::parse("stringset:a:b").unwrap();
        assert_eq!(
            state,
            ConversationState::AwaitingContentValue {
                kind: AssetKind::Text,
                literal: "a:b".into()
            }
        );
    }

    #[test]
    fn strict_parse_rejects_garbage() {
        for token in [
            "",
            "garbage",
            "enternamereservation",
            "enternamereservation:abc",
            "imgset:",
            "start:1",
            "unknown:thing",
        ] {
            assert!(
                matches!(
                    ConversationState::parse(token),
                    Err(TicketbotError::Malformed { .. })
                ),
                "{token:?} should be malformed"
            );
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn lenient_decode_falls_back_to_idle() {
        assert_eq!(ConversationState::decode("nonsense"), ConversationState::Idle);
        assert!(logs_contain("unreadable state token"));
    }

    #[test]
    fn awaited_reservation_only_for_name_state() {
        assert_eq!(
            ConversationState::AwaitingReservationName(7).awaited_reservation(),
            Some(7)
        );
        assert_eq!(ConversationState::Idle.awaited_reservation(), None);
    }

    fn any_state() -> impl Strategy<Value = ConversationState> {
        prop_oneof![
            Just(ConversationState::Idle),
            Just(ConversationState::AwaitingTicketText),
            any::<i64>().prop_map(ConversationState::AwaitingReservationName),
            ("[a-z_:]{1,24}", any::<bool>()).prop_map(|(literal, image)| {
                ConversationState::AwaitingContentValue {
                    kind: if image { AssetKind::Image } else { AssetKind::Text },
                    literal,
                }
            }),
        ]
    }

    proptest! {
        #[test]
        fn token_decodes_to_same_state(state in any_state()) {
            prop_assert_eq!(ConversationState::parse(&state.encode()).unwrap(), state);
        }
    }
}
