//! # minimon Notifier - Webhook
//!
//! Delivers each message as a JSON document over HTTP, one attempt per
//! message:
//!
//! ```json
//! {"kind": "aggregate", "title": "web-1 Failure: 1", "body": " - / failed: 3% free\n", "timestamp": 1700000000}
//! ```

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minimon_protocols::{Message, MessageKind, Notifier, NotifierError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Type name used in configuration.
pub const NOTIFIER_TYPE: &str = "webhook";

/// Webhook configuration (the notifier's `params` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL.
    pub url: String,
    /// HTTP method, `POST` or `PUT`.
    #[serde(default = "default_method")]
    pub method: String,
    /// Additional headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Webhook payload.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub kind: MessageKind,
    pub title: &'a str,
    pub body: &'a str,
    pub timestamp: i64,
}

/// Webhook notifier implementation.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    /// Create a notifier, checking the configuration.
    pub fn new(config: WebhookConfig) -> Result<Self, NotifierError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(NotifierError::InvalidParams(format!(
                "url must start with http:// or https://, got '{}'",
                config.url
            )));
        }
        let method = config.method.to_uppercase();
        if method != "POST" && method != "PUT" {
            return Err(NotifierError::InvalidParams(format!(
                "unsupported method '{}', expected POST or PUT",
                config.method
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifierError::InvalidParams(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            config: WebhookConfig { method, ..config },
            client,
        })
    }

    /// Build from a `params` table.
    pub fn from_params(params: &serde_json::Value) -> Result<Self, NotifierError> {
        let config: WebhookConfig = serde_json::from_value(params.clone())
            .map_err(|e| NotifierError::InvalidParams(e.to_string()))?;
        Self::new(config)
    }

    /// Factory suitable for the notifier registry.
    pub fn factory(params: &serde_json::Value) -> Result<Arc<dyn Notifier>, NotifierError> {
        Ok(Arc::new(Self::from_params(params)?))
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    async fn send_webhook(&self, payload: &WebhookPayload<'_>) -> Result<(), NotifierError> {
        let mut request = match self.config.method.as_str() {
            "PUT" => self.client.put(&self.config.url),
            _ => self.client.post(&self.config.url),
        };

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifierError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::SendFailed(format!("HTTP {}: {}", status, body)));
        }

        debug!("Webhook delivered successfully to {}", self.config.url);
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        NOTIFIER_TYPE
    }

    async fn send(&self, message: &Message) -> Result<(), NotifierError> {
        let payload = WebhookPayload {
            kind: message.kind,
            title: &message.title,
            body: &message.body,
            timestamp: chrono::Utc::now().timestamp(),
        };

        // At most once, no retries.
        self.send_webhook(&payload).await
    }
}
