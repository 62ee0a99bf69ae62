// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete engine with a mock channel and a temp
//! SQLite database. Provides `send_text()` and `press()` to drive the full
//! conversation pipeline in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ticketbot_config::model::{StorageConfig, TicketbotConfig};
use ticketbot_core::types::{ContentEntry, Event, InboundEvent, Sender, User};
use ticketbot_core::{Role, StorageAdapter, TicketbotError};
use ticketbot_engine::{BotEngine, CommandRegistry};
use ticketbot_storage::SqliteStorage;

use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: TicketbotConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = TicketbotConfig::default();
        config.admin.password = Some("letmein".to_string());
        config.export.enabled = false;
        Self { config }
    }

    pub fn with_seat_limit(mut self, seat_limit: u32) -> Self {
        self.config.reservation.seat_limit = seat_limit;
        self
    }

    pub fn with_admin_password(mut self, password: Option<&str>) -> Self {
        self.config.admin.password = password.map(str::to_string);
        self
    }

    pub fn with_admin_id(mut self, admin_id: i64) -> Self {
        self.config.admin.admin_id = Some(admin_id);
        self
    }

    /// Full control over the configuration. The database path is always
    /// replaced by a temp file.
    pub fn with_config(mut self, config: TicketbotConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, TicketbotError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| TicketbotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        config.export.path = temp_dir
            .path()
            .join("paid.csv")
            .to_string_lossy()
            .to_string();

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let channel = Arc::new(MockChannel::new());
        let config = Arc::new(config);
        let engine = BotEngine::new(
            channel.clone(),
            storage.clone(),
            config.clone(),
            Arc::new(CommandRegistry::standard()),
        );

        Ok(TestHarness {
            engine,
            channel,
            storage,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine wired to a mock channel and a temp database.
pub struct TestHarness {
    pub engine: BotEngine,
    pub channel: Arc<MockChannel>,
    pub storage: Arc<SqliteStorage>,
    pub config: Arc<TicketbotConfig>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings.
    pub async fn new() -> Result<Self, TicketbotError> {
        Self::builder().build().await
    }

    /// A sender with a predictable profile: `User<id>` / `user<id>`.
    pub fn sender(id: i64) -> Sender {
        Sender {
            id,
            username: Some(format!("user{id}")),
            first_name: format!("User{id}"),
            last_name: None,
        }
    }

    /// Delivers a private text message (or command) from `user_id`.
    pub async fn send_text(&self, user_id: i64, text: &str) -> Result<(), TicketbotError> {
        self.engine
            .handle_event(&InboundEvent::message(Self::sender(user_id), text))
            .await
    }

    /// Delivers a button press carrying `data` from `user_id`.
    pub async fn press(&self, user_id: i64, data: &str) -> Result<(), TicketbotError> {
        self.engine
            .handle_event(&InboundEvent::callback(Self::sender(user_id), data))
            .await
    }

    pub async fn deliver(&self, event: InboundEvent) -> Result<(), TicketbotError> {
        self.engine.handle_event(&event).await
    }

    pub async fn seed_event(&self, date: DateTime<Utc>) -> Result<Event, TicketbotError> {
        self.storage.seed_event(date).await
    }

    pub async fn set_content(&self, literal: &str, content: &str) -> Result<(), TicketbotError> {
        self.storage
            .set_content(&ContentEntry {
                literal: literal.to_string(),
                content: content.to_string(),
                metadata: "[]".to_string(),
            })
            .await
    }

    pub async fn user(&self, id: i64) -> Result<User, TicketbotError> {
        self.storage.get_or_create_user(id).await
    }

    /// Makes `id` a full admin without going through `/secret`.
    pub async fn make_admin(&self, id: i64) -> Result<(), TicketbotError> {
        self.storage.get_or_create_user(id).await?;
        self.storage.set_user_role(id, Role::ADMIN).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketbot_core::ConversationState;

    #[tokio::test]
    async fn harness_builds_and_creates_users() {
        let harness = TestHarness::new().await.unwrap();
        harness.send_text(5, "hello").await.unwrap();
        let user = harness.user(5).await.unwrap();
        assert_eq!(user.state, ConversationState::Idle);
        assert!(!user.is_admin());
    }

    #[tokio::test]
    async fn builder_applies_options() {
        let harness = TestHarness::builder()
            .with_seat_limit(3)
            .with_admin_id(99)
            .with_admin_password(None)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.reservation.seat_limit, 3);
        assert_eq!(harness.config.admin.admin_id, Some(99));
        assert!(harness.config.admin.password.is_none());
    }
}
