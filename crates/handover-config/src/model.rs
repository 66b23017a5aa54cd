// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Handover relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Handover configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandoverConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging-provider API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Relay coordination settings.
    #[serde(default)]
    pub relay: RelayConfig,
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("handover").join("handover.db"))
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "handover.db".to_string())
}

/// Messaging-provider API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Base URL of the provider's Graph-style API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Access token. `None` requires the environment variable override.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone-number id used as the sending identity.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Pre-approved template name used outside the session window.
    #[serde(default = "default_template_name")]
    pub template_name: String,

    /// Template language code.
    #[serde(default = "default_template_language")]
    pub template_language: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: None,
            phone_number_id: None,
            template_name: default_template_name(),
            template_language: default_template_language(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_template_name() -> String {
    "agent_reply".to_string()
}

fn default_template_language() -> String {
    "en".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Relay coordination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Seconds an unauthenticated dashboard connection may stay open.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,

    /// Delay before the delivery-confirmation check runs for a sent message.
    #[serde(default = "default_delivery_check_delay_secs")]
    pub delivery_check_delay_secs: u64,

    /// Provider session window in hours; conversations idle longer than
    /// this require a template message.
    #[serde(default = "default_session_window_hours")]
    pub session_window_hours: i64,

    /// Maximum provider delivery attempts per message.
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: u32,

    /// Base backoff delay between delivery attempts, in seconds.
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            auth_timeout_secs: default_auth_timeout_secs(),
            delivery_check_delay_secs: default_delivery_check_delay_secs(),
            session_window_hours: default_session_window_hours(),
            max_delivery_attempts: default_max_delivery_attempts(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
        }
    }
}

fn default_auth_timeout_secs() -> u64 {
    10
}

fn default_delivery_check_delay_secs() -> u64 {
    30
}

fn default_session_window_hours() -> i64 {
    24
}

fn default_max_delivery_attempts() -> u32 {
    3
}

fn default_retry_base_delay_secs() -> u64 {
    2
}
