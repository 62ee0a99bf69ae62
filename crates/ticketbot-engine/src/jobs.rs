// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background jobs: the task runner, the pre-event reminder scan, and the
//! periodic export sync.
//!
//! Each job runs on its own interval until the cancellation token fires.
//! A failing item is logged and reported to `admin.admin_id`; the pass
//! carries on with the next one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ticketbot_core::types::{OutboundMessage, Task, TaskKind};
use ticketbot_core::{SheetExporter, TicketbotError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::content::literals;
use crate::context::BotContext;
use crate::export::build_export_rows;

/// True when an event at `event_date` entered the reminder window during the
/// scan period ending at `now`: `lead - tick < event_date - now <= lead`.
pub fn reminder_due(
    event_date: DateTime<Utc>,
    now: DateTime<Utc>,
    lead: chrono::Duration,
    tick: chrono::Duration,
) -> bool {
    let delta = event_date - now;
    delta <= lead && delta > lead - tick
}

/// Runs scheduled tasks and the periodic scans.
pub struct JobRunner {
    ctx: BotContext,
    exporter: Option<Arc<dyn SheetExporter>>,
}

impl JobRunner {
    /// `exporter` is ignored when `export.enabled` is off.
    pub fn new(ctx: BotContext, exporter: Option<Arc<dyn SheetExporter>>) -> Self {
        let exporter = exporter.filter(|_| ctx.config.export.enabled);
        Self { ctx, exporter }
    }

    /// Starts the three job loops.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let jobs = &self.ctx.config.jobs;
        let task_every = Duration::from_secs(jobs.task_interval_secs);
        let notify_every = Duration::from_secs(jobs.notify_interval_secs);
        let sync_every = Duration::from_secs(jobs.sync_interval_secs);

        info!(
            task_secs = jobs.task_interval_secs,
            notify_secs = jobs.notify_interval_secs,
            sync_secs = jobs.sync_interval_secs,
            export = self.exporter.is_some(),
            "starting background jobs"
        );

        let mut handles = Vec::with_capacity(3);

        let runner = self.clone();
        handles.push(tokio::spawn(tick_loop(
            "tasks",
            task_every,
            cancel.clone(),
            move || {
                let runner = runner.clone();
                async move {
                    runner.run_pending_tasks().await;
                }
            },
        )));

        let runner = self.clone();
        handles.push(tokio::spawn(tick_loop(
            "notify",
            notify_every,
            cancel.clone(),
            move || {
                let runner = runner.clone();
                async move {
                    if let Err(e) = runner.scan_upcoming(Utc::now()).await {
                        runner.report("reminder scan", &e).await;
                    }
                }
            },
        )));

        if self.exporter.is_some() {
            let runner = self;
            handles.push(tokio::spawn(tick_loop("sync", sync_every, cancel, move || {
                let runner = runner.clone();
                async move {
                    if let Err(e) = runner.sync_export().await {
                        runner.report("export sync", &e).await;
                    }
                }
            })));
        }

        handles
    }

    /// Executes and removes every pending task. Returns how many succeeded.
    pub async fn run_pending_tasks(&self) -> usize {
        let tasks = match self.ctx.storage.list_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                self.report("task listing", &e).await;
                return 0;
            }
        };

        let mut done = 0;
        for task in tasks {
            match self.execute(&task).await {
                Ok(()) => done += 1,
                Err(e) => self.report(&format!("task {} ({})", task.id, task.kind), &e).await,
            }
            if let Err(e) = self.ctx.storage.delete_task(task.id).await {
                warn!(task_id = task.id, error = %e, "failed to delete task");
            }
        }
        done
    }

    async fn execute(&self, task: &Task) -> Result<(), TicketbotError> {
        debug!(task_id = task.id, kind = %task.kind, "running task");
        match task.kind {
            TaskKind::SyncSheet => self.sync_export().await.map(|_| ()),
            TaskKind::NotifyAboutEvent => {
                let event_id = task
                    .event_id
                    .ok_or_else(|| TicketbotError::malformed("notify task", task.id.to_string()))?;
                self.notify_holders(event_id).await.map(|_| ())
            }
        }
    }

    /// Schedules a reminder for every event that just entered the lead
    /// window. Returns the event ids.
    pub async fn scan_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<i64>, TicketbotError> {
        let jobs = &self.ctx.config.jobs;
        let lead = chrono::Duration::minutes(jobs.notify_lead_minutes as i64);
        let tick = chrono::Duration::seconds(jobs.notify_interval_secs as i64);

        let mut due = Vec::new();
        for event in self.ctx.storage.list_events().await? {
            if !reminder_due(event.date, now, lead, tick) {
                continue;
            }
            match self
                .ctx
                .storage
                .schedule_task(TaskKind::NotifyAboutEvent, Some(event.id))
                .await
            {
                Ok(_) => {
                    info!(event_id = event.id, "pre-event reminder scheduled");
                    due.push(event.id);
                }
                Err(e) => warn!(event_id = event.id, error = %e, "failed to schedule reminder"),
            }
        }
        Ok(due)
    }

    /// Sends the reminder to every holder of `event_id`, one task per
    /// recipient. Returns the number of recipients.
    pub async fn notify_holders(&self, event_id: i64) -> Result<usize, TicketbotError> {
        let reservations = self.ctx.ledger.list_by_event(event_id).await?;
        let text = self.ctx.content.text(literals::NOTIFY_PRE_EVENT).await;
        let entities = self.ctx.content.entities(literals::NOTIFY_PRE_EVENT).await;

        for reservation in &reservations {
            let ctx = self.ctx.clone();
            let msg = OutboundMessage::text(reservation.user_id, text.clone())
                .with_entities(entities.clone());
            tokio::spawn(async move { ctx.deliver(msg).await });
        }
        Ok(reservations.len())
    }

    /// Writes the paid snapshot. Returns the row count; 0 when export is off.
    pub async fn sync_export(&self) -> Result<usize, TicketbotError> {
        let Some(exporter) = &self.exporter else {
            debug!("export disabled, sync skipped");
            return Ok(0);
        };
        let rows = build_export_rows(self.ctx.storage.as_ref(), self.ctx.local_offset()).await?;
        exporter.export(&rows).await?;
        Ok(rows.len())
    }

    async fn report(&self, what: &str, e: &TicketbotError) {
        error!(job = what, error = %e, "background job failed");
        self.ctx
            .alert_operator(&format!("Error occurred: {what}: {e}"))
            .await;
    }
}

async fn tick_loop<F, Fut>(name: &'static str, every: Duration, cancel: CancellationToken, mut f: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => f().await,
            _ = cancel.cancelled() => {
                info!(job = name, "job loop stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 28, h, m, s).unwrap()
    }

    #[test]
    fn reminder_window_bounds() {
        let lead = chrono::Duration::minutes(480);
        let tick = chrono::Duration::seconds(60);
        let event = at(18, 0, 0);

        // Exactly eight hours before: due.
        assert!(reminder_due(event, at(10, 0, 0), lead, tick));
        // Just inside the tick.
        assert!(reminder_due(event, at(10, 0, 59), lead, tick));
        // A full tick later: the previous scan already covered it.
        assert!(!reminder_due(event, at(10, 1, 0), lead, tick));
        // Too early.
        assert!(!reminder_due(event, at(9, 59, 59), lead, tick));
        // Past events never qualify.
        assert!(!reminder_due(event, at(19, 0, 0), lead, tick));
    }

    #[test]
    fn consecutive_scans_hit_the_window_once() {
        let lead = chrono::Duration::minutes(480);
        let tick = chrono::Duration::seconds(60);
        let event = at(18, 0, 0);
        let start = at(9, 50, 17);

        let hits = (0..30)
            .map(|i| start + tick * i)
            .filter(|now| reminder_due(event, *now, lead, tick))
            .count();
        assert_eq!(hits, 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_task_is_logged_and_reported() {
        use ticketbot_config::model::{StorageConfig, TicketbotConfig};
        use ticketbot_core::StorageAdapter;
        use ticketbot_storage::SqliteStorage;
        use ticketbot_test_utils::MockChannel;

        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("jobs.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let mut config = TicketbotConfig::default();
        config.admin.admin_id = Some(77);

        let ctx = BotContext::new(channel.clone(), storage.clone(), Arc::new(config));
        let runner = JobRunner::new(ctx, None);
        storage
            .schedule_task(TaskKind::NotifyAboutEvent, None)
            .await
            .unwrap();

        assert_eq!(runner.run_pending_tasks().await, 0);
        assert!(logs_contain("background job failed"));
        let reports = channel.sent_to(77).await;
        assert_eq!(reports.len(), 1);
        assert!(reports[0].body().starts_with("Error occurred: task "));
    }
}
