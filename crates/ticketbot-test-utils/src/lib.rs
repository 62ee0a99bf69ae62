// SPDX-FileCopyrightText: 2026 Ticketbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ticketbot integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock chat transport with update injection and capture
//! - [`TestHarness`] - Full engine over a temp SQLite database

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
