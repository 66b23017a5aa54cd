// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Handover relay.
//!
//! The REST surface and the dashboard socket protocol are thin adapters
//! over `handover-relay`; no coordination logic lives here.

pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{GatewayState, ServerConfig, build_router, start_server};
