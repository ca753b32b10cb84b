use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::alert::AlertMessage;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("notification channel unavailable: {0}")]
    ChannelUnavailable(String),
}

/// Outbound notification transport.
///
/// Concrete transports (webhook, log file, ...) are swappable behind this
/// trait; the dispatcher's retry and suppression logic never touches them
/// directly.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short channel name for logs.
    fn name(&self) -> &'static str;

    /// Deliver one alert message.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the message cannot be delivered or the
    /// channel is unavailable. The dispatcher retries per its policy.
    async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError>;
}
