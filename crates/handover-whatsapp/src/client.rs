// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Business messages API.
//!
//! Provides [`WhatsAppClient`], the production [`DeliveryProvider`]:
//! request construction for session-text and template payloads, bearer
//! authentication, and classification of failures into retryable and
//! non-retryable [`DeliveryError`] variants. Retry itself lives with the
//! caller's policy, not here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use handover_config::model::WhatsAppConfig;
use handover_core::{
    DeliveryConfirmation, DeliveryError, DeliveryProvider, DeliveryReceipt, HandoverError,
    OutboundKind,
};

use crate::types::{ApiErrorResponse, DeliveryStatusResponse, SendMessageResponse};

/// HTTP client for provider API communication.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    base_url: String,
    phone_number_id: String,
    template_name: String,
    template_language: String,
}

impl WhatsAppClient {
    /// Creates a new provider client from configuration.
    ///
    /// Fails with a configuration error when the access token or phone
    /// number id is missing.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, HandoverError> {
        let token = config
            .access_token
            .as_deref()
            .ok_or_else(|| HandoverError::Config("whatsapp.access_token is required".into()))?;
        let phone_number_id = config
            .phone_number_id
            .clone()
            .ok_or_else(|| HandoverError::Config("whatsapp.phone_number_id is required".into()))?;

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {token}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&bearer)
                .map_err(|e| HandoverError::Config(format!("invalid access token: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| HandoverError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            phone_number_id,
            template_name: config.template_name.clone(),
            template_language: config.template_language.clone(),
        })
    }

    fn outbound_body(&self, phone: &str, text: &str, kind: OutboundKind) -> serde_json::Value {
        match kind {
            OutboundKind::Session => serde_json::json!({
                "messaging_product": "whatsapp",
                "to": phone,
                "type": "text",
                "text": { "body": text },
            }),
            OutboundKind::Template => serde_json::json!({
                "messaging_product": "whatsapp",
                "to": phone,
                "type": "template",
                "template": {
                    "name": self.template_name,
                    "language": { "code": self.template_language },
                    "components": [{
                        "type": "body",
                        "parameters": [{ "type": "text", "text": text }],
                    }],
                },
            }),
        }
    }
}

#[async_trait]
impl DeliveryProvider for WhatsAppClient {
    async fn deliver(
        &self,
        phone: &str,
        text: &str,
        kind: OutboundKind,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let body = self.outbound_body(phone, text, kind);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        debug!(status = %status, kind = ?kind, "provider send response");

        if status.is_success() {
            let resp: SendMessageResponse =
                response.json().await.map_err(|e| {
                    DeliveryError::Transient(format!("unreadable provider response: {e}"))
                })?;
            let handle = resp.messages.into_iter().next().ok_or_else(|| {
                DeliveryError::Permanent("provider accepted send but returned no message id".into())
            })?;
            return Ok(DeliveryReceipt {
                external_id: handle.id,
            });
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body_text))
    }

    async fn check_delivery(
        &self,
        external_id: &str,
    ) -> Result<DeliveryConfirmation, DeliveryError> {
        let url = format!("{}/{}", self.base_url, external_id);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status")])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        debug!(status = %status, external_id = %external_id, "delivery status response");

        if status.is_success() {
            let resp: DeliveryStatusResponse =
                response.json().await.map_err(|e| {
                    DeliveryError::Transient(format!("unreadable provider response: {e}"))
                })?;
            let confirmed = matches!(resp.status.as_str(), "delivered" | "read");
            return Ok(if confirmed {
                DeliveryConfirmation::Confirmed
            } else {
                DeliveryConfirmation::Unconfirmed
            });
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body_text))
    }
}

/// Map a reqwest transport error into the delivery taxonomy.
fn map_request_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else {
        DeliveryError::Transient(format!("HTTP request failed: {err}"))
    }
}

/// Classify a non-success status: 408/429/5xx are retryable, everything
/// else is a provider rejection.
fn classify_status(status: StatusCode, body: &str) -> DeliveryError {
    let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => api_err.error.message,
        Err(_) => format!("{status}: {body}"),
    };

    if is_transient_status(status) {
        DeliveryError::Transient(detail)
    } else {
        DeliveryError::Permanent(detail)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            api_base_url: base_url.to_string(),
            access_token: Some("test-token".to_string()),
            phone_number_id: Some("555000".to_string()),
            template_name: "agent_reply".to_string(),
            template_language: "en".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn missing_token_is_config_error() {
        let mut config = test_config("https://example.com");
        config.access_token = None;
        assert!(WhatsAppClient::new(&config).is_err());
    }

    #[test]
    fn transient_status_classification() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn deliver_session_message_returns_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/555000/messages"))
            .and(body_partial_json(serde_json::json!({
                "type": "text",
                "to": "+15550001111",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{"id": "wamid.test1"}],
            })))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(&test_config(&server.uri())).unwrap();
        let receipt = client
            .deliver("+15550001111", "hello", OutboundKind::Session)
            .await
            .unwrap();
        assert_eq!(receipt.external_id, "wamid.test1");
    }

    #[tokio::test]
    async fn deliver_template_message_uses_template_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/555000/messages"))
            .and(body_partial_json(serde_json::json!({
                "type": "template",
                "template": { "name": "agent_reply" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{"id": "wamid.test2"}],
            })))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(&test_config(&server.uri())).unwrap();
        let receipt = client
            .deliver("+15550001111", "hello again", OutboundKind::Template)
            .await
            .unwrap();
        assert_eq!(receipt.external_id, "wamid.test2");
    }

    #[tokio::test]
    async fn rejected_send_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/555000/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Invalid recipient", "code": 131026},
            })))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .deliver("+bad", "hello", OutboundKind::Session)
            .await
            .unwrap_err();
        match err {
            DeliveryError::Permanent(msg) => assert!(msg.contains("Invalid recipient")),
            other => panic!("expected permanent error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn overloaded_send_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/555000/messages"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .deliver("+15550001111", "hello", OutboundKind::Session)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn check_delivery_confirms_delivered_and_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wamid.test1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "delivered",
            })))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(&test_config(&server.uri())).unwrap();
        let confirmation = client.check_delivery("wamid.test1").await.unwrap();
        assert_eq!(confirmation, DeliveryConfirmation::Confirmed);
    }

    #[tokio::test]
    async fn check_delivery_unconfirmed_when_still_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wamid.test1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "sent",
            })))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(&test_config(&server.uri())).unwrap();
        let confirmation = client.check_delivery("wamid.test1").await.unwrap();
        assert_eq!(confirmation, DeliveryConfirmation::Unconfirmed);
    }
}
