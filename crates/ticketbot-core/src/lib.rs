// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ticketbot reservation bot.
//!
//! This crate provides the adapter traits, the error type, the conversation
//! state codec, the privilege model and the domain types shared by every
//! other crate in the workspace.

pub mod error;
pub mod role;
pub mod state;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TicketbotError;
pub use role::Role;
pub use state::{AssetKind, ConversationState};
pub use types::{AdapterType, HealthStatus, MessageId, ReservationStatus};

pub use traits::{ChannelAdapter, PluginAdapter, SheetExporter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_errors_are_classified() {
        let dup = TicketbotError::DuplicateReservation {
            user_id: 1,
            event_id: 2,
        };
        let full = TicketbotError::CapacityExceeded {
            event_id: 2,
            seat_limit: 10,
        };
        let transition = TicketbotError::InvalidTransition {
            reservation_id: 3,
            status: ReservationStatus::Paid,
            action: "record name",
        };
        assert!(dup.is_business_rule());
        assert!(full.is_business_rule());
        assert!(transition.is_business_rule());

        assert!(!TicketbotError::not_found("event", 9).is_business_rule());
        assert!(!TicketbotError::Internal("x".into()).is_business_rule());
    }

    #[test]
    fn error_messages_carry_context() {
        let err = TicketbotError::InvalidTransition {
            reservation_id: 3,
            status: ReservationStatus::Paid,
            action: "record name",
        };
        assert_eq!(err.to_string(), "reservation 3 is Paid, cannot record name");

        let err = TicketbotError::not_found("content", "start");
        assert_eq!(err.to_string(), "content not found: start");
    }

    #[test]
    fn adapter_type_round_trips_through_strum() {
        use std::str::FromStr;

        for variant in [AdapterType::Channel, AdapterType::Storage, AdapterType::Exporter] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn reservation_status_parses_stored_form() {
        use std::str::FromStr;

        assert_eq!(
            ReservationStatus::from_str("Booked").unwrap(),
            ReservationStatus::Booked
        );
        assert_eq!(ReservationStatus::Paid.to_string(), "Paid");
        assert!(ReservationStatus::from_str("Refunded").is_err());
    }

    #[test]
    fn health_status_variants() {
        assert_eq!(HealthStatus::Healthy, HealthStatus::Healthy);
        assert_ne!(HealthStatus::Degraded("slow".into()), HealthStatus::Healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_sheet_exporter<T: SheetExporter>() {}
    }

    mod types_tests {
        use crate::types::*;

        #[test]
        fn largest_photo_picks_biggest_variant() {
            let mut event = InboundEvent::message(Sender::default(), "");
            event.photo_variants = vec![
                PhotoVariant { file_id: "s".into(), size: 10 },
                PhotoVariant { file_id: "l".into(), size: 300 },
                PhotoVariant { file_id: "m".into(), size: 120 },
            ];
            assert_eq!(event.largest_photo().unwrap().file_id, "l");
        }

        #[test]
        fn text_entity_serializes_bot_api_shape() {
            let entity = TextEntity::new("bold", 0, 4);
            let json = serde_json::to_string(&vec![entity]).unwrap();
            assert_eq!(json, r#"[{"type":"bold","offset":0,"length":4}]"#);

            let parsed: Vec<TextEntity> = serde_json::from_str(
                r#"[{"type":"text_link","offset":1,"length":2,"url":"https://t.me"}]"#,
            )
            .unwrap();
            assert_eq!(parsed[0].url.as_deref(), Some("https://t.me"));
        }

        #[test]
        fn full_name_skips_missing_last_name() {
            let mut profile = UserProfile {
                user_id: 1,
                username: None,
                first_name: "Ada".into(),
                last_name: None,
            };
            assert_eq!(profile.full_name(), "Ada");
            profile.last_name = Some("Lovelace".into());
            assert_eq!(profile.full_name(), "Ada Lovelace");
        }

        #[test]
        fn membership_subscription() {
            assert!(MembershipStatus::Member.is_subscribed());
            assert!(MembershipStatus::Owner.is_subscribed());
            assert!(!MembershipStatus::Left.is_subscribed());
            assert!(!MembershipStatus::Restricted.is_subscribed());
        }

        #[test]
        fn keyboard_lists_callback_payloads() {
            let kb = Keyboard {
                rows: vec![
                    vec![Button::callback("a", "reservedate:1")],
                    vec![Button::url("channel", "https://t.me/x"), Button::callback("b", "more_info")],
                ],
            };
            assert_eq!(kb.callback_payloads(), vec!["reservedate:1", "more_info"]);
        }
    }
}
