// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin-editable bot content.
//!
//! Every user-facing text (and the start image) lives in storage under a
//! literal key. Reads never fail the caller: an absent key yields a visible
//! placeholder so an unconfigured bot still answers.

use std::sync::Arc;

use ticketbot_core::types::{ContentEntry, TextEntity};
use ticketbot_core::{StorageAdapter, TicketbotError};
use tracing::{debug, warn};

/// Metadata returned for literals that were never written.
pub const EMPTY_METADATA: &str = "[]";

/// Placeholder text for a literal that has not been set yet.
pub fn uninitialized(literal: &str) -> String {
    format!("[Uninitialized] Init in Admin panel! Literal: {literal}")
}

/// Well-known content literals.
pub mod literals {
    pub const PREVIEW_IMAGE: &str = "preview_image";
    pub const START: &str = "start";
    pub const LEAVE_TICKET_BUTTON: &str = "leave_ticket_button";
    pub const SUPPORT_CHAT_ID: &str = "supportchatid";
    pub const CHANNEL_ID: &str = "channelid";
    pub const SENDED_NOTIFY: &str = "sended_notify";
    pub const LEAVETICKET_MESSAGE: &str = "leaveticket_message";
    pub const SUBSCRIBE_MESSAGE: &str = "subscribe_message";
    pub const CHANNEL_LINK: &str = "channel_link";
    pub const MORE_INFO: &str = "more_info";
    pub const MORE_INFO_TEXT: &str = "more_info_text";
    pub const NOTIFY_PRE_EVENT: &str = "notify_pre_event";
    pub const RESERVED_MESSAGE: &str = "reserved_message";
    pub const SOLDOUT_MESSAGE: &str = "soldout_message";
    pub const ALREADY_BOOKED_MESSAGE: &str = "already_booked_message";
    pub const ASK_TO_PAY: &str = "ask_to_pay";
    pub const PAID_BUTTON: &str = "paid_button";
    pub const POST_PAYMENT_MESSAGE: &str = "post_payment_message";
}

/// Read/write access to content entries.
#[derive(Clone)]
pub struct ContentStore {
    storage: Arc<dyn StorageAdapter>,
}

impl ContentStore {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Returns the content for `literal`, or the placeholder together with
    /// the reason it could not be read.
    pub async fn get(&self, literal: &str) -> (String, Option<TicketbotError>) {
        match self.storage.get_content(literal).await {
            Ok(Some(entry)) => (entry.content, None),
            Ok(None) => (
                uninitialized(literal),
                Some(TicketbotError::not_found("content", literal)),
            ),
            Err(e) => {
                warn!(literal, error = %e, "content read failed");
                (uninitialized(literal), Some(e))
            }
        }
    }

    /// The content for `literal`, or the placeholder.
    pub async fn text(&self, literal: &str) -> String {
        self.get(literal).await.0
    }

    /// The stored content, failing with `NotFound` when the literal was
    /// never written.
    pub async fn require(&self, literal: &str) -> Result<String, TicketbotError> {
        match self.get(literal).await {
            (content, None) => Ok(content),
            (_, Some(e)) => Err(e),
        }
    }

    /// The stored content when it exists and is non-empty.
    pub async fn non_empty(&self, literal: &str) -> Option<String> {
        self.require(literal).await.ok().filter(|c| !c.is_empty())
    }

    /// Serialized entities of `literal`, `"[]"` when absent.
    pub async fn get_metadata(&self, literal: &str) -> String {
        match self.storage.get_content(literal).await {
            Ok(Some(entry)) => entry.metadata,
            Ok(None) => EMPTY_METADATA.to_string(),
            Err(e) => {
                warn!(literal, error = %e, "content metadata read failed");
                EMPTY_METADATA.to_string()
            }
        }
    }

    /// Parsed entities of `literal`. Unreadable metadata yields none.
    pub async fn entities(&self, literal: &str) -> Vec<TextEntity> {
        parse_entities(literal, &self.get_metadata(literal).await)
    }

    /// Inserts or replaces `literal`. Last write wins.
    pub async fn set(
        &self,
        literal: &str,
        content: &str,
        metadata: &str,
    ) -> Result<(), TicketbotError> {
        debug!(literal, "content updated");
        self.storage
            .set_content(&ContentEntry {
                literal: literal.to_string(),
                content: content.to_string(),
                metadata: metadata.to_string(),
            })
            .await
    }

    /// Reads a content value holding a chat id.
    pub async fn chat_id(&self, literal: &str) -> Result<i64, TicketbotError> {
        let raw = self.require(literal).await?;
        raw.trim()
            .parse::<i64>()
            .map_err(|_| TicketbotError::malformed("chat id", raw))
    }
}

/// Serializes entities for storage.
pub fn serialize_entities(entities: &[TextEntity]) -> String {
    serde_json::to_string(entities).unwrap_or_else(|_| EMPTY_METADATA.to_string())
}

fn parse_entities(literal: &str, metadata: &str) -> Vec<TextEntity> {
    if metadata.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(metadata).unwrap_or_else(|e| {
        warn!(literal, error = %e, "unreadable entity metadata");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketbot_config::model::StorageConfig;
    use ticketbot_storage::SqliteStorage;

    async fn store() -> (ContentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("content.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let storage = SqliteStorage::new(config);
        storage.initialize().await.unwrap();
        (ContentStore::new(Arc::new(storage)), dir)
    }

    #[tokio::test]
    async fn missing_literal_returns_sentinel_and_not_found() {
        let (store, _dir) = store().await;
        let (content, err) = store.get("nonexistent_key").await;
        assert_eq!(
            content,
            "[Uninitialized] Init in Admin panel! Literal: nonexistent_key"
        );
        assert!(matches!(err, Some(TicketbotError::NotFound { .. })));
        assert_eq!(store.get_metadata("nonexistent_key").await, "[]");
        assert!(store.entities("nonexistent_key").await.is_empty());
    }

    #[tokio::test]
    async fn set_then_get_returns_what_was_written() {
        let (store, _dir) = store().await;
        let entities = vec![TextEntity::new("bold", 0, 5)];
        let metadata = serialize_entities(&entities);
        store.set("start", "Hello there", &metadata).await.unwrap();

        let (content, err) = store.get("start").await;
        assert_eq!(content, "Hello there");
        assert!(err.is_none());
        assert_eq!(store.get_metadata("start").await, metadata);
        assert_eq!(store.entities("start").await, entities);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let (store, _dir) = store().await;
        store.set("start", "one", "").await.unwrap();
        store.set("start", "two", "[]").await.unwrap();
        assert_eq!(store.text("start").await, "two");
    }

    #[tokio::test]
    async fn empty_value_is_present_but_not_non_empty() {
        let (store, _dir) = store().await;
        store.set("preview_image", "", "").await.unwrap();
        assert_eq!(store.require("preview_image").await.unwrap(), "");
        assert!(store.non_empty("preview_image").await.is_none());
    }

    #[tokio::test]
    async fn chat_id_parses_or_reports() {
        let (store, _dir) = store().await;
        assert!(matches!(
            store.chat_id("supportchatid").await,
            Err(TicketbotError::NotFound { .. })
        ));
        store.set("supportchatid", "-100123", "").await.unwrap();
        assert_eq!(store.chat_id("supportchatid").await.unwrap(), -100123);
        store.set("channelid", "not a number", "").await.unwrap();
        assert!(matches!(
            store.chat_id("channelid").await,
            Err(TicketbotError::Malformed { .. })
        ));
    }

    #[test]
    fn garbage_metadata_parses_to_nothing() {
        assert!(parse_entities("x", "{not json").is_empty());
        assert!(parse_entities("x", "").is_empty());
    }
}
