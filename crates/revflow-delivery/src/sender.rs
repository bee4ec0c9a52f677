//! HTTP batch sender.

use crate::error::DeliveryResult;
use crate::payload::batch_payload;
use crate::DeliveryError;
use chrono::Utc;
use reqwest::Client;
use revflow_events::Message;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Request timeout for a single batch send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a delivery job needs to reach the ingestion endpoint.
///
/// Serialized into job params so persisted jobs can reconstruct their sender
/// after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConfig {
    /// Delivery base URL; the batch endpoint is `<serverUrl>/batch`.
    pub server_url: String,
    /// Workspace write key, sent as the `X-API-Key` header.
    pub api_key: String,
}

impl DeliveryConfig {
    /// Creates a delivery config.
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Extracts the delivery settings from the SDK configuration.
    pub fn from_config(config: &revflow_config::Config) -> Self {
        Self::new(config.server_url.clone(), config.api_key.clone())
    }
}

/// Sends message batches over HTTP.
pub struct BatchSender {
    config: DeliveryConfig,
    client: Client,
}

impl BatchSender {
    /// Creates a sender for the given endpoint.
    pub fn new(config: DeliveryConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// POSTs one batch, stamping `sentAt` immediately before the send.
    ///
    /// Any `2xx` status is success; everything else is a
    /// [`DeliveryError::Status`].
    pub async fn send_batch(&self, messages: &[Message]) -> DeliveryResult<()> {
        let url = format!("{}/batch", self.config.server_url);
        let payload = batch_payload(messages, Utc::now())?;

        debug!(url = %url, count = messages.len(), "Sending batch");

        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revflow_events::{MessageContext, MessageType};

    #[test]
    fn from_config_carries_url_and_key() {
        let mut config = revflow_config::Config::new("write-key");
        config.server_url = "https://ingest.example.com".to_string();

        let delivery = DeliveryConfig::from_config(&config);
        assert_eq!(delivery.server_url, "https://ingest.example.com");
        assert_eq!(delivery.api_key, "write-key");
    }

    #[test]
    fn config_serializes_camel_case() {
        let config = DeliveryConfig::new("https://x", "k");
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["serverUrl"], serde_json::json!("https://x"));
        assert_eq!(value["apiKey"], serde_json::json!("k"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Nothing listens here; the connection is refused immediately.
        let sender = BatchSender::new(DeliveryConfig::new("http://127.0.0.1:9", "k"));
        let message = Message::new(MessageType::Track, MessageContext::default());

        let err = sender.send_batch(&[message]).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Http(_)));
    }
}
