// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound updates,
//! captured outbound traffic, scripted membership answers and per-chat send
//! failures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use ticketbot_core::traits::adapter::PluginAdapter;
use ticketbot_core::traits::channel::ChannelAdapter;
use ticketbot_core::types::{
    AdapterType, HealthStatus, InboundEvent, MembershipStatus, MessageId, OutboundMessage,
};
use ticketbot_core::TicketbotError;

/// A mock messaging channel for testing.
///
/// - **inbound**: updates injected via `inject()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured for assertions
/// - **answered** / **deleted**: callback acknowledgements and deletions
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    answered: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<(i64, MessageId)>>>,
    membership: Arc<Mutex<HashMap<(i64, i64), MembershipStatus>>>,
    failing_chats: Arc<Mutex<HashSet<i64>>>,
    notify: Arc<Notify>,
    sent_notify: Arc<Notify>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            answered: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            membership: Arc::new(Mutex::new(HashMap::new())),
            failing_chats: Arc::new(Mutex::new(HashSet::new())),
            notify: Arc::new(Notify::new()),
            sent_notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue an inbound update for `receive()`.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Makes `receive()` fail with a "channel closed" error once the queue
    /// is empty.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// All messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages sent to one chat, in order.
    pub async fn sent_to(&self, chat_id: i64) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Waits until at least `count` messages were sent, or `timeout` passes.
    /// Returns whether the count was reached.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.sent_notify.notified();
                if self.sent_count().await >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Callback ids acknowledged through `answer_callback()`.
    pub async fn answered_callbacks(&self) -> Vec<String> {
        self.answered.lock().await.clone()
    }

    pub async fn deleted_messages(&self) -> Vec<(i64, MessageId)> {
        self.deleted.lock().await.clone()
    }

    /// Scripts the answer of `chat_membership(chat_id, user_id)`.
    /// Unscripted pairs answer `Left`.
    pub async fn set_membership(&self, chat_id: i64, user_id: i64, status: MembershipStatus) {
        self.membership
            .lock()
            .await
            .insert((chat_id, user_id), status);
    }

    /// Makes every send to `chat_id` fail with a transport error.
    pub async fn fail_sends_to(&self, chat_id: i64) {
        self.failing_chats.lock().await.insert(chat_id);
    }

    pub async fn restore_sends_to(&self, chat_id: i64) {
        self.failing_chats.lock().await.remove(&chat_id);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, TicketbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TicketbotError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), TicketbotError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, TicketbotError> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(TicketbotError::Transport {
                    message: "mock channel closed".to_string(),
                    source: None,
                });
            }
            notified.await;
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, TicketbotError> {
        if self.failing_chats.lock().await.contains(&msg.chat_id) {
            return Err(TicketbotError::Transport {
                message: format!("chat {} rejected the message", msg.chat_id),
                source: None,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().await.push(msg);
        self.sent_notify.notify_waiters();
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn delete_message(
        &self,
        chat_id: i64,
        message_id: &MessageId,
    ) -> Result<(), TicketbotError> {
        self.deleted
            .lock()
            .await
            .push((chat_id, message_id.clone()));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TicketbotError> {
        self.answered.lock().await.push(callback_id.to_string());
        Ok(())
    }

    async fn chat_membership(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<MembershipStatus, TicketbotError> {
        Ok(self
            .membership
            .lock()
            .await
            .get(&(chat_id, user_id))
            .copied()
            .unwrap_or(MembershipStatus::Left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketbot_core::types::Sender;

    fn sender() -> Sender {
        Sender {
            id: 10,
            first_name: "Ann".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn inject_and_receive() {
        let channel = MockChannel::new();
        channel.inject(InboundEvent::message(sender(), "hello")).await;
        let event = channel.receive().await.unwrap();
        assert_eq!(event.text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let rx = channel.clone();
        let handle = tokio::spawn(async move { rx.receive().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        channel.inject(InboundEvent::message(sender(), "later")).await;

        let event = handle.await.unwrap().unwrap();
        assert_eq!(event.text.as_deref(), Some("later"));
    }

    #[tokio::test]
    async fn close_ends_receive() {
        let channel = MockChannel::new();
        channel.close();
        let err = channel.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn send_captures_and_fails_on_demand() {
        let channel = MockChannel::new();
        channel.send(OutboundMessage::text(1, "a")).await.unwrap();
        channel.fail_sends_to(2).await;
        assert!(channel.send(OutboundMessage::text(2, "b")).await.is_err());

        assert_eq!(channel.sent_count().await, 1);
        assert_eq!(channel.sent_to(1).await[0].body(), "a");
        assert!(channel.sent_to(2).await.is_empty());

        channel.restore_sends_to(2).await;
        channel.send(OutboundMessage::text(2, "c")).await.unwrap();
        assert_eq!(channel.sent_to(2).await.len(), 1);
    }

    #[tokio::test]
    async fn membership_defaults_to_left() {
        let channel = MockChannel::new();
        assert_eq!(
            channel.chat_membership(-100, 10).await.unwrap(),
            MembershipStatus::Left
        );
        channel
            .set_membership(-100, 10, MembershipStatus::Member)
            .await;
        assert!(channel
            .chat_membership(-100, 10)
            .await
            .unwrap()
            .is_subscribed());
    }

    #[tokio::test]
    async fn wait_for_sent_sees_background_sends() {
        let channel = Arc::new(MockChannel::new());
        let tx = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(OutboundMessage::text(1, "x")).await.unwrap();
        });
        assert!(channel.wait_for_sent(1, Duration::from_secs(2)).await);
        assert!(!channel.wait_for_sent(5, Duration::from_millis(20)).await);
    }
}
