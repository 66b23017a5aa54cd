// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and non-zero timers.

use thiserror::Error;

use crate::model::HandoverConfig;

/// A configuration error surfaced to the operator at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML/env layers failed to deserialize.
    #[error("{0}")]
    Parse(String),

    /// A semantic constraint on a deserialized value failed.
    #[error("{message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &HandoverConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.relay.auth_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "relay.auth_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.relay.max_delivery_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "relay.max_delivery_attempts must be at least 1".to_string(),
        });
    }

    if config.relay.session_window_hours <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "relay.session_window_hours must be positive, got {}",
                config.relay.session_window_hours
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
