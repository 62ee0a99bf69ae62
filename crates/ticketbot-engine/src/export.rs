// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paid-reservation snapshot and the CSV sheet it is written to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::FixedOffset;
use ticketbot_core::types::ExportRow;
use ticketbot_core::{
    AdapterType, HealthStatus, PluginAdapter, ReservationStatus, SheetExporter, StorageAdapter,
    TicketbotError,
};
use tracing::{debug, warn};

use crate::format::full_date;

/// Collects every paid reservation joined with its profile and event date.
pub async fn build_export_rows(
    storage: &dyn StorageAdapter,
    offset: FixedOffset,
) -> Result<Vec<ExportRow>, TicketbotError> {
    let events: HashMap<i64, _> = storage
        .list_events()
        .await?
        .into_iter()
        .map(|e| (e.id, e.date))
        .collect();

    let mut rows = Vec::new();
    for reservation in storage.list_reservations().await? {
        if reservation.status != ReservationStatus::Paid {
            continue;
        }
        let profile = match storage.get_profile(reservation.user_id).await {
            Ok(profile) => profile.unwrap_or_default(),
            Err(e) => {
                warn!(
                    reservation_id = reservation.id,
                    user_id = reservation.user_id,
                    error = %e,
                    "profile lookup failed, exporting without it"
                );
                Default::default()
            }
        };
        let event_date = events
            .get(&reservation.event_id)
            .map(|date| full_date(*date, offset))
            .unwrap_or_default();

        rows.push(ExportRow {
            telegram_id: reservation.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name.unwrap_or_default(),
            username: profile.username.unwrap_or_default(),
            entered_name: reservation.entered_name,
            event_date,
            phone: String::new(),
            status: reservation.status.to_string(),
        });
    }
    Ok(rows)
}

/// Writes the snapshot to a CSV file, replacing it atomically.
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn csv_error(e: csv::Error) -> TicketbotError {
    TicketbotError::Internal(format!("csv export failed: {e}"))
}

fn io_error(e: std::io::Error) -> TicketbotError {
    TicketbotError::Internal(format!("csv export failed: {e}"))
}

fn write_snapshot(path: &Path, rows: &[ExportRow]) -> Result<(), TicketbotError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let tmp = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp).map_err(csv_error)?;
    if rows.is_empty() {
        // serde headers are only emitted with the first record.
        writer
            .write_record([
                "telegram_id",
                "first_name",
                "last_name",
                "username",
                "entered_name",
                "event_date",
                "phone",
                "status",
            ])
            .map_err(csv_error)?;
    }
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(io_error)?;
    drop(writer);
    std::fs::rename(&tmp, path).map_err(io_error)
}

#[async_trait]
impl PluginAdapter for CsvExporter {
    fn name(&self) -> &str {
        "csv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Exporter
    }

    async fn health_check(&self) -> Result<HealthStatus, TicketbotError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => Ok(
                HealthStatus::Degraded(format!("{} does not exist yet", dir.display())),
            ),
            _ => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), TicketbotError> {
        Ok(())
    }
}

#[async_trait]
impl SheetExporter for CsvExporter {
    async fn export(&self, rows: &[ExportRow]) -> Result<(), TicketbotError> {
        let path = self.path.clone();
        let rows = rows.to_vec();
        let count = rows.len();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &rows))
            .await
            .map_err(|e| TicketbotError::Internal(format!("export task failed: {e}")))??;
        debug!(path = %self.path.display(), rows = count, "export written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str) -> ExportRow {
        ExportRow {
            telegram_id: id,
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            username: "ann".into(),
            entered_name: name.into(),
            event_date: "28.03.2025 18:00".into(),
            phone: String::new(),
            status: "Paid".into(),
        }
    }

    #[tokio::test]
    async fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("paid.csv");
        let exporter = CsvExporter::new(&path);

        exporter.export(&[row(1, "Ann Lee"), row(2, "Bob")]).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "telegram_id,first_name,last_name,username,entered_name,event_date,phone,status"
        );
        assert_eq!(lines[1], "1,Ann,Lee,ann,Ann Lee,28.03.2025 18:00,,Paid");
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn every_export_overwrites_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paid.csv");
        let exporter = CsvExporter::new(&path);

        exporter.export(&[row(1, "A"), row(2, "B")]).await.unwrap();
        exporter.export(&[]).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1, "only the header remains");
        assert!(!dir.path().join("paid.csv.tmp").exists());
    }
}
