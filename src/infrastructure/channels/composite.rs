use async_trait::async_trait;

use crate::domain::entities::alert::AlertMessage;
use crate::domain::ports::channel::{ChannelError, NotificationChannel};

/// Forwards notifications to multiple channels.
///
/// Calls each channel in order, collecting errors.
/// Returns the first error encountered (if any), but always calls all channels.
pub struct CompositeChannel {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl CompositeChannel {
    #[must_use]
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }
}

impl Default for CompositeChannel {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl NotificationChannel for CompositeChannel {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError> {
        let mut first_error = None;
        for channel in &self.channels {
            if let Err(e) = channel.send(message).await {
                tracing::warn!(channel = channel.name(), "notification failed: {e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
