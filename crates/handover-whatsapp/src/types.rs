// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the provider's Graph-style messages API.

use serde::Deserialize;

/// Successful response to a message send.
#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    pub messages: Vec<MessageHandle>,
}

/// One accepted message handle.
#[derive(Debug, Deserialize)]
pub struct MessageHandle {
    /// The provider's delivery identifier (`wamid.*`).
    pub id: String,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Provider error detail.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Response to a delivery-status lookup.
#[derive(Debug, Deserialize)]
pub struct DeliveryStatusResponse {
    /// `accepted`, `sent`, `delivered`, `read`, or `failed`.
    pub status: String,
}
