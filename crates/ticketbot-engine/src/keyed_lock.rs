// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user serialization of conversation transitions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A map of async mutexes keyed by user id.
///
/// Holding the guard returned by [`KeyedLock::lock`] guarantees no other
/// transition for the same user runs concurrently. Different keys never
/// contend.
#[derive(Debug, Default)]
pub struct KeyedLock {
    slots: DashMap<i64, Arc<Mutex<()>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: i64) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        slot.lock_owned().await
    }

    /// Drops slots nobody holds or waits on.
    pub fn prune(&self) {
        self.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
