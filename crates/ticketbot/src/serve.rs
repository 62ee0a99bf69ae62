// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ticketbot serve` command implementation.
//!
//! Opens storage, seeds configured events, connects Telegram, starts the
//! background jobs and runs the engine until a shutdown signal arrives.

use std::sync::Arc;

use ticketbot_config::model::TicketbotConfig;
use ticketbot_core::{ChannelAdapter, PluginAdapter, SheetExporter, StorageAdapter, TicketbotError};
use ticketbot_engine::ledger::Ledger;
use ticketbot_engine::{BotEngine, CommandRegistry, CsvExporter, JobRunner, shutdown};
use ticketbot_storage::SqliteStorage;
use ticketbot_telegram::TelegramChannel;
use tracing::{info, warn};

/// Runs the `ticketbot serve` command.
pub async fn run_serve(config: TicketbotConfig) -> Result<(), TicketbotError> {
    init_tracing(&config.bot.log_level);

    info!(bot = %config.bot.name, "starting ticketbot serve");

    let mut channel = TelegramChannel::new(&config.telegram)?;

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let config = Arc::new(config);
    let ledger = Ledger::new(storage.clone(), &config.reservation);
    ledger.seed_events(&config.events).await?;

    channel.connect().await?;
    let channel = Arc::new(channel);

    let engine = BotEngine::new(
        channel.clone(),
        storage.clone(),
        config.clone(),
        Arc::new(CommandRegistry::standard()),
    );

    let exporter: Arc<dyn SheetExporter> = Arc::new(CsvExporter::new(&config.export.path));
    let runner = Arc::new(JobRunner::new(engine.context().clone(), Some(exporter)));

    let cancel = shutdown::install_signal_handler();
    let jobs = runner.spawn(cancel.clone());

    info!(
        seat_limit = config.reservation.seat_limit,
        export = config.export.enabled,
        "ticketbot ready"
    );

    let result = engine.run(cancel.clone()).await;

    // The engine also stops when the channel closes; make sure the jobs follow.
    cancel.cancel();
    for outcome in futures::future::join_all(jobs).await {
        if let Err(e) = outcome {
            warn!(error = %e, "background job ended abnormally");
        }
    }

    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    storage.close().await?;
    info!("ticketbot stopped");
    result
}

/// Level comes from `bot.log_level`; `RUST_LOG` wins when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ticketbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
