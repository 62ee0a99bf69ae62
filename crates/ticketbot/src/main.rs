// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticketbot - a Telegram bot that sells event seats.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod export;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ticketbot_config::{ConfigError, TicketbotConfig};

/// Ticketbot - a Telegram bot that sells event seats.
#[derive(Parser, Debug)]
#[command(name = "ticketbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot and its background jobs.
    Serve,
    /// Write the paid-reservation snapshot once and exit.
    Export {
        /// Output file. Defaults to `export.path`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<TicketbotConfig, Vec<ConfigError>> {
    match path {
        Some(path) => ticketbot_config::load_and_validate_path(path),
        None => ticketbot_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            ticketbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Export { output }) => export::run_export(config, output).await,
        Some(Commands::CheckConfig) => {
            println!(
                "ticketbot: config ok (bot.name={}, seat_limit={}, events={})",
                config.bot.name,
                config.reservation.seat_limit,
                config.events.len()
            );
            Ok(())
        }
        None => {
            println!("ticketbot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands_and_global_config() {
        let cli = Cli::parse_from(["ticketbot", "export", "-o", "out.csv", "--config", "t.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("t.toml")));
        match cli.command {
            Some(Commands::Export { output }) => {
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("expected export, got {other:?}"),
        }

        let cli = Cli::parse_from(["ticketbot", "check-config"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }

    #[test]
    fn binary_loads_inline_defaults() {
        let config = ticketbot_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.bot.name, "ticketbot");
    }
}
