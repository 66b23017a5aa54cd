// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Handover relay.
//!
//! [`HandoverError`] covers infrastructure faults (configuration, storage,
//! provider, transport). The per-operation enums (`AuthError`,
//! `TakeoverError`, `SendError`) are what dashboard-facing operations
//! return; the gateway maps them onto `{status: "error", message}` reply
//! envelopes. No operation leaves the caller without a response.

use thiserror::Error;

/// The primary error type for infrastructure-level failures.
#[derive(Debug, Error)]
pub enum HandoverError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging-provider errors (API failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport errors (bind failure, socket I/O).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by presence authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The agent id or display name was missing or empty.
    #[error("agent id and name are required")]
    InvalidCredentials,

    /// The durable agent upsert failed. The connection mapping is not
    /// recorded and the caller must close the connection.
    #[error("agent registration failed: {0}")]
    Store(#[from] HandoverError),
}

/// Errors returned by the takeover operation.
#[derive(Debug, Error)]
pub enum TakeoverError {
    /// The target conversation does not exist.
    #[error("chat {0} not found")]
    ChatNotFound(i64),

    /// Persisting the mode change failed.
    #[error("takeover could not be persisted: {0}")]
    Store(#[from] HandoverError),
}

/// Errors returned by the agent message-send operation.
#[derive(Debug, Error)]
pub enum SendError {
    /// The conversation is still owned by the automated responder.
    #[error("chat {chat_id} is not assigned to a human agent")]
    WrongMode { chat_id: i64 },

    /// The target conversation does not exist.
    #[error("chat {0} not found")]
    ChatNotFound(i64),

    /// The provider rejected the message after exhausting retries.
    #[error("message delivery failed: {0}")]
    Provider(String),

    /// The provider did not answer within the request deadline.
    #[error("message delivery timed out")]
    ProviderTimeout,

    /// Persisting the message or its status failed.
    #[error("message could not be persisted: {0}")]
    Store(#[from] HandoverError),
}

/// Errors surfaced by a [`DeliveryProvider`] implementation.
///
/// The classification drives the retry policy: `Transient` and `Timeout`
/// are retried with backoff, `Permanent` is not.
///
/// [`DeliveryProvider`]: crate::traits::DeliveryProvider
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Network or provider-side transient failure (retryable).
    #[error("transient provider error: {0}")]
    Transient(String),

    /// The provider rejected the request (not retryable).
    #[error("provider rejected request: {0}")]
    Permanent(String),

    /// The provider did not answer within the request deadline (retryable).
    #[error("provider request timed out")]
    Timeout,
}

impl DeliveryError {
    /// Whether the retry policy may re-attempt after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Transient(_) | DeliveryError::Timeout)
    }
}

impl From<DeliveryError> for SendError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Timeout => SendError::ProviderTimeout,
            other => SendError::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_retryability() {
        assert!(DeliveryError::Transient("503".into()).is_retryable());
        assert!(DeliveryError::Timeout.is_retryable());
        assert!(!DeliveryError::Permanent("bad number".into()).is_retryable());
    }

    #[test]
    fn delivery_error_maps_to_send_error() {
        let send: SendError = DeliveryError::Timeout.into();
        assert!(matches!(send, SendError::ProviderTimeout));

        let send: SendError = DeliveryError::Permanent("invalid recipient".into()).into();
        match send {
            SendError::Provider(msg) => assert!(msg.contains("invalid recipient")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn auth_error_wraps_storage_failure() {
        let inner = HandoverError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        let err = AuthError::from(inner);
        assert!(err.to_string().contains("agent registration failed"));
    }
}
