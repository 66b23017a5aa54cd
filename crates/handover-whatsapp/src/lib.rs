// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business API delivery client for the Handover relay.

pub mod client;
pub mod types;

pub use client::WhatsAppClient;
