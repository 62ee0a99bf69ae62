// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exporter trait for the paid-reservation snapshot.

use async_trait::async_trait;

use crate::error::TicketbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ExportRow;

/// Writes the full snapshot of paid reservations to an external sheet.
///
/// Every call overwrites the previous snapshot.
#[async_trait]
pub trait SheetExporter: PluginAdapter {
    async fn export(&self, rows: &[ExportRow]) -> Result<(), TicketbotError>;
}
