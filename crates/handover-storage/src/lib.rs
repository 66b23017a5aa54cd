// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Handover relay.
//!
//! The [`Database`] struct is the single writer: every query module
//! accepts `&Database` and runs its statements on tokio-rusqlite's one
//! background thread, which serializes all access and eliminates
//! SQLITE_BUSY under concurrency.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::{Agent, Chat, Message};
