// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ticketbot.toml` > `~/.config/ticketbot/ticketbot.toml`
//! > `/etc/ticketbot/ticketbot.toml`, with environment variable overrides via
//! the `TICKETBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TicketbotConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/ticketbot/ticketbot.toml";
pub const LOCAL_CONFIG_PATH: &str = "ticketbot.toml";

/// Config sections addressable from the environment. No name is a prefix of
/// another.
const ENV_SECTIONS: &[&str] = &[
    "bot",
    "telegram",
    "admin",
    "storage",
    "reservation",
    "jobs",
    "export",
];

/// `~/.config/ticketbot/ticketbot.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ticketbot").join("ticketbot.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ticketbot/ticketbot.toml` (system-wide)
/// 3. `~/.config/ticketbot/ticketbot.toml` (user XDG config)
/// 4. `./ticketbot.toml` (local directory)
/// 5. `TICKETBOT_*` environment variables
pub fn load_config() -> Result<TicketbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the defaults, without files or env.
pub fn load_config_from_str(toml_content: &str) -> Result<TicketbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TicketbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TicketbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TicketbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(TicketbotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(LOCAL_CONFIG_PATH)).merge(env_provider())
}

/// Maps `TICKETBOT_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `TICKETBOT_TELEGRAM_BOT_TOKEN` maps to `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("TICKETBOT_").map(|key| env_key_to_path(key.as_str()).into())
}

pub(crate) fn env_key_to_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
