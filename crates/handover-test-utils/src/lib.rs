// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Handover relay: a scripted mock delivery
//! provider and a fully wired harness over temp SQLite.

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder, drain_events};
pub use mock_provider::{MockProvider, RecordedDelivery};
