//! Alert delivery channel.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

/// Capability interface polled by the orchestrator.
///
/// Any connection lifecycle stays inside the implementation; `send`
/// reports delivery failure as `false`, never as an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn is_ready(&self) -> bool;

    async fn send(&self, target: &str, text: &str) -> bool;
}

/// Posts `{"to", "text"}` JSON to a chat gateway webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(url, client))
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn is_ready(&self) -> bool {
        !self.url.is_empty()
    }

    async fn send(&self, target: &str, text: &str) -> bool {
        let body = json!({ "to": target, "text": text });
        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                info!(recipient = %target, "Message delivered to {}", target);
                true
            }
            Ok(response) => {
                warn!(
                    recipient = %target,
                    status = response.status().as_u16(),
                    "Webhook rejected message for {}",
                    target
                );
                false
            }
            Err(e) => {
                error!(recipient = %target, error = %e, "Failed to deliver message to {}", target);
                false
            }
        }
    }
}

/// Dry-run channel: prints instead of delivering.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn is_ready(&self) -> bool {
        true
    }

    async fn send(&self, target: &str, text: &str) -> bool {
        info!(recipient = %target, "Delivery skipped, message would be:\n{}", text);
        true
    }
}
