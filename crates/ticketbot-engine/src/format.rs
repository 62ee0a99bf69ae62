// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text shown to users, support staff and the export, rendered in venue time.

use chrono::{DateTime, FixedOffset, Utc};
use ticketbot_core::types::{Event, UserProfile};

/// Callback payload prefixes understood by the router.
pub const RESERVE_DATE_PREFIX: &str = "reservedate";
pub const PAID_PREFIX: &str = "paidcallback";
pub const UPDATE_PREFIX: &str = "update";

/// Label of a date selection button, e.g. `Going on 28.03.2025 (Fri) at 18:00`.
pub fn date_button_label(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset)
        .format("Going on %d.%m.%Y (%a) at %H:%M")
        .to_string()
}

pub fn reserve_date_payload(event: &Event) -> String {
    format!("{RESERVE_DATE_PREFIX}:{}", event.id)
}

pub fn paid_payload(reservation_id: i64) -> String {
    format!("{PAID_PREFIX}:{reservation_id}")
}

pub fn update_payload(literal: &str) -> String {
    format!("{UPDATE_PREFIX}:{literal}")
}

/// `dd.mm HH:MM`
pub fn short_date(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset).format("%d.%m %H:%M").to_string()
}

/// `dd.mm.yyyy HH:MM`, used in the export.
pub fn full_date(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset)
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

/// A support ticket as forwarded to the support chat.
pub fn support_ticket(profile: &UserProfile, text: &str) -> String {
    format!(
        "User: {}\nUsername: {}\nText:\n{text}",
        profile.full_name(),
        profile.username_or_empty()
    )
}

/// The support-chat notice for a confirmed payment.
pub fn paid_notice(profile: &UserProfile, event_date: DateTime<Utc>, offset: FixedOffset) -> String {
    format!(
        "User {} ({}) paid for {}",
        profile.first_name,
        profile.username_or_empty(),
        short_date(event_date, offset)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dubai() -> FixedOffset {
        FixedOffset::east_opt(4 * 3600).unwrap()
    }

    fn march_28() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 28, 14, 0, 0).unwrap()
    }

    #[test]
    fn button_label_uses_local_time_and_weekday() {
        assert_eq!(
            date_button_label(march_28(), dubai()),
            "Going on 28.03.2025 (Fri) at 18:00"
        );
    }

    #[test]
    fn payloads() {
        let event = Event {
            id: 3,
            date: march_28(),
        };
        assert_eq!(reserve_date_payload(&event), "reservedate:3");
        assert_eq!(paid_payload(42), "paidcallback:42");
        assert_eq!(update_payload("start"), "update:start");
    }

    #[test]
    fn dates_render_in_venue_time() {
        assert_eq!(short_date(march_28(), dubai()), "28.03 18:00");
        assert_eq!(full_date(march_28(), dubai()), "28.03.2025 18:00");
    }

    #[test]
    fn ticket_and_notice_text() {
        let profile = UserProfile {
            user_id: 1,
            username: Some("ann".into()),
            first_name: "Ann".into(),
            last_name: Some("Lee".into()),
        };
        assert_eq!(
            support_ticket(&profile, "help"),
            "User: Ann Lee\nUsername: ann\nText:\nhelp"
        );
        assert_eq!(
            paid_notice(&profile, march_28(), dubai()),
            "User Ann (ann) paid for 28.03 18:00"
        );
    }
}
