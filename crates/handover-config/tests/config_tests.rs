// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Handover configuration system.

use handover_config::{HandoverConfig, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_handover_config() {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 8090
cors_origins = ["https://dashboard.example.com"]
log_level = "debug"

[storage]
database_path = "/tmp/handover-test.db"

[whatsapp]
api_base_url = "https://graph.example.com/v21.0"
access_token = "tok-123"
phone_number_id = "555000"
template_name = "agent_followup"
template_language = "en_US"
request_timeout_secs = 15

[relay]
auth_timeout_secs = 5
delivery_check_delay_secs = 20
session_window_hours = 24
max_delivery_attempts = 3
retry_base_delay_secs = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8090);
    assert_eq!(
        config.server.cors_origins,
        vec!["https://dashboard.example.com"]
    );
    assert_eq!(config.storage.database_path, "/tmp/handover-test.db");
    assert_eq!(config.whatsapp.access_token.as_deref(), Some("tok-123"));
    assert_eq!(config.whatsapp.phone_number_id.as_deref(), Some("555000"));
    assert_eq!(config.whatsapp.template_name, "agent_followup");
    assert_eq!(config.relay.auth_timeout_secs, 5);
    assert_eq!(config.relay.delivery_check_delay_secs, 20);
}

/// Empty TOML produces the compiled defaults.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    let defaults = HandoverConfig::default();
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.relay.auth_timeout_secs, 10);
    assert_eq!(config.relay.delivery_check_delay_secs, 30);
    assert_eq!(config.relay.session_window_hours, 24);
    assert_eq!(config.relay.max_delivery_attempts, 3);
}

/// Unknown keys are rejected by `deny_unknown_fields`.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[relay]
auth_timeout = 5
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Validation errors from an otherwise-parsable config are surfaced.
#[test]
fn invalid_values_fail_validation() {
    let toml = r#"
[relay]
auth_timeout_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("auth_timeout_secs"))
    );
}
