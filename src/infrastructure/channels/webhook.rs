use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::entities::alert::AlertMessage;
use crate::domain::ports::channel::{ChannelError, NotificationChannel};

/// Sends alert notifications to an HTTP webhook endpoint as JSON.
///
/// A non-2xx response is a delivery failure; the dispatcher decides
/// whether to retry.
pub struct WebhookChannel {
    url: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// Creates a new webhook channel targeting the given URL.
    ///
    /// The HTTP client is configured with a 5-second timeout covering
    /// DNS resolution, connection, and response.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::ChannelUnavailable` if the HTTP client
    /// cannot be initialized (e.g. TLS backend failure).
    pub fn new(url: String) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                ChannelError::ChannelUnavailable(format!("cannot build HTTP client: {e}"))
            })?;

        Ok(Self { url, client })
    }

    fn payload(message: &AlertMessage) -> Value {
        json!({
            "source": "remonitor",
            "target": &message.target_id,
            "from": format!("{}", message.from),
            "to": format!("{}", message.to),
            "timestamp": message.timestamp.to_rfc3339(),
            "transitions": message.transitions,
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError> {
        let payload = Self::payload(message);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(format!("webhook error: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::SendFailed(format!(
                "webhook HTTP {}",
                response.status()
            )))
        }
    }
}
