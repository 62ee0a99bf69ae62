// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ticketbot export`: one-shot paid-reservation snapshot.

use std::path::PathBuf;

use ticketbot_config::model::TicketbotConfig;
use ticketbot_core::{SheetExporter, StorageAdapter, TicketbotError};
use ticketbot_engine::CsvExporter;
use ticketbot_engine::export::build_export_rows;
use ticketbot_storage::SqliteStorage;

/// Writes the snapshot to `output` (or `export.path`) regardless of
/// `export.enabled`.
pub async fn run_export(
    config: TicketbotConfig,
    output: Option<PathBuf>,
) -> Result<(), TicketbotError> {
    let path = output.unwrap_or_else(|| PathBuf::from(&config.export.path));
    let offset = config.bot.utc_offset().ok_or_else(|| {
        TicketbotError::Config("bot.utc_offset_hours is out of range".into())
    })?;

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;

    let rows = build_export_rows(&storage, offset).await?;
    let exporter = CsvExporter::new(&path);
    exporter.export(&rows).await?;
    storage.close().await?;

    println!("ticketbot: exported {} paid reservations to {}", rows.len(), path.display());
    Ok(())
}
