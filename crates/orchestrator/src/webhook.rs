//! Fire-and-forget webhook delivery of completed results.
//!
//! Delivery is best-effort: the caller already has the result by the
//! time the webhook fires, so a failed POST is logged and dropped, and
//! never affects the response or the job outcome.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts result payloads to a configured URL, if any.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .expect("webhook HTTP client construction");
        Self { client, url }
    }

    /// Whether a webhook URL is configured at all.
    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Spawn a delivery of `result` wrapped in an event envelope.
    /// Returns immediately; the POST runs on its own task.
    pub fn dispatch<T: Serialize>(&self, kind: &'static str, result: &T) {
        let Some(url) = self.url.clone() else {
            return;
        };
        let payload = json!({
            "event": kind,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "result": result,
        });
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(url = %url, event = kind, "Webhook delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        url = %url,
                        event = kind,
                        status = %response.status(),
                        "Webhook endpoint rejected the delivery"
                    );
                }
                Err(e) => {
                    tracing::warn!(url = %url, event = kind, error = %e, "Webhook delivery failed");
                }
            }
        });
    }
}
