// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as parseable event dates, non-empty paths, and non-zero intervals.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::TicketbotConfig;

/// Largest UTC offset in use anywhere, in hours.
const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TicketbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if let Some(password) = &config.admin.password
        && password.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "admin.password must not be empty when set".to_string(),
        });
    }

    if config.reservation.seat_limit < 1 {
        errors.push(ConfigError::Validation {
            message: "reservation.seat_limit must be at least 1".to_string(),
        });
    }

    if config.bot.utc_offset_hours.abs() > MAX_UTC_OFFSET_HOURS {
        errors.push(ConfigError::Validation {
            message: format!(
                "bot.utc_offset_hours must be within +-{MAX_UTC_OFFSET_HOURS}, got {}",
                config.bot.utc_offset_hours
            ),
        });
    }

    let intervals = [
        ("jobs.sync_interval_secs", config.jobs.sync_interval_secs),
        ("jobs.notify_interval_secs", config.jobs.notify_interval_secs),
        ("jobs.notify_lead_minutes", config.jobs.notify_lead_minutes),
        ("jobs.task_interval_secs", config.jobs.task_interval_secs),
    ];
    for (key, value) in intervals {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    }

    if config.export.enabled && config.export.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "export.path must not be empty when export is enabled".to_string(),
        });
    }

    let mut seen_dates = HashSet::new();
    for (i, event) in config.events.iter().enumerate() {
        match event.parse_date() {
            Ok(date) => {
                if !seen_dates.insert(date) {
                    errors.push(ConfigError::Validation {
                        message: format!("duplicate event date `{}` in [[events]]", event.date),
                    });
                }
            }
            Err(e) => errors.push(ConfigError::Validation {
                message: format!("events[{i}].date `{}` is not RFC 3339: {e}", event.date),
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
