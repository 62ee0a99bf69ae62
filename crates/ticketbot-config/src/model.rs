// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ticketbot reservation bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Top-level Ticketbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TicketbotConfig {
    /// Bot identity, logging and local time settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Admin bootstrap settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Seat capacity and booking defaults.
    #[serde(default)]
    pub reservation: ReservationConfig,

    /// Background job intervals.
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Paid-reservation export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Events seeded into storage at startup.
    #[serde(default)]
    pub events: Vec<EventSeedConfig>,
}

/// Bot identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot, used in logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Offset of the venue's local time from UTC, in hours. Used for every
    /// date shown to users and written to the export.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl BotConfig {
    /// The configured offset, or `None` when out of range.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours.checked_mul(3600)?)
    }
}

fn default_bot_name() -> String {
    "ticketbot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_utc_offset_hours() -> i32 {
    4
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Admin bootstrap configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Password accepted by `/secret`. `None` means only existing admins can
    /// re-elevate.
    #[serde(default)]
    pub password: Option<String>,

    /// Chat that receives background job failure alerts.
    #[serde(default)]
    pub admin_id: Option<i64>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("ticketbot").join("ticketbot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("ticketbot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Reservation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationConfig {
    /// Maximum number of reservations per event.
    #[serde(default = "default_seat_limit")]
    pub seat_limit: u32,

    /// Attendee name stored until the user types one.
    #[serde(default = "default_reservation_name")]
    pub default_name: String,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            seat_limit: default_seat_limit(),
            default_name: default_reservation_name(),
        }
    }
}

fn default_seat_limit() -> u32 {
    10
}

fn default_reservation_name() -> String {
    "Not specified".to_string()
}

/// Background job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Seconds between periodic export syncs.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Seconds between pre-event notification scans.
    #[serde(default = "default_notify_interval_secs")]
    pub notify_interval_secs: u64,

    /// How long before an event its holders are reminded, in minutes.
    #[serde(default = "default_notify_lead_minutes")]
    pub notify_lead_minutes: u64,

    /// Seconds between task runner passes.
    #[serde(default = "default_task_interval_secs")]
    pub task_interval_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: default_sync_interval_secs(),
            notify_interval_secs: default_notify_interval_secs(),
            notify_lead_minutes: default_notify_lead_minutes(),
            task_interval_secs: default_task_interval_secs(),
        }
    }
}

fn default_sync_interval_secs() -> u64 {
    60
}

fn default_notify_interval_secs() -> u64 {
    60
}

fn default_notify_lead_minutes() -> u64 {
    8 * 60
}

fn default_task_interval_secs() -> u64 {
    5
}

/// Export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Enable the export sync loop and `SyncSheet` task handling.
    #[serde(default = "default_export_enabled")]
    pub enabled: bool,

    /// CSV file overwritten on every sync.
    #[serde(default = "default_export_path")]
    pub path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: default_export_enabled(),
            path: default_export_path(),
        }
    }
}

fn default_export_enabled() -> bool {
    true
}

fn default_export_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("ticketbot").join("paid.csv"))
        .unwrap_or_else(|| std::path::PathBuf::from("paid.csv"))
        .to_string_lossy()
        .into_owned()
}

/// One `[[events]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventSeedConfig {
    /// RFC 3339 timestamp, e.g. `2025-03-28T18:00:00+04:00`.
    pub date: String,
}

impl EventSeedConfig {
    pub fn parse_date(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.date).map(|d| d.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TicketbotConfig::default();
        assert_eq!(config.reservation.seat_limit, 10);
        assert_eq!(config.jobs.notify_lead_minutes, 480);
        assert_eq!(config.jobs.task_interval_secs, 5);
        assert!(config.export.enabled);
        assert!(config.events.is_empty());
        assert!(config.storage.database_path.ends_with("ticketbot.db"));
    }

    #[test]
    fn events_array_deserializes() {
        let toml_str = r#"
[[events]]
date = "2025-03-28T18:00:00+04:00"

[[events]]
date = "2025-04-01T18:00:00+04:00"
"#;
        let config: TicketbotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.events.len(), 2);
        assert_eq!(config.events[1].date, "2025-04-01T18:00:00+04:00");
    }

    #[test]
    fn events_deny_unknown_fields() {
        let toml_str = r#"
[[events]]
date = "2025-03-28T18:00:00+04:00"
seats = 5
"#;
        assert!(toml::from_str::<TicketbotConfig>(toml_str).is_err());
    }
}
