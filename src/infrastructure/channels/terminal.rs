use async_trait::async_trait;
use colored::Colorize;

use crate::domain::entities::alert::AlertMessage;
use crate::domain::ports::channel::{ChannelError, NotificationChannel};
use crate::domain::value_objects::health_status::HealthStatus;

/// Prints alerts to stdout with the destination status colorized.
#[derive(Default)]
pub struct TerminalChannel;

impl TerminalChannel {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn status_badge(status: HealthStatus) -> colored::ColoredString {
        let label = status.to_string();
        match status {
            HealthStatus::Healthy => label.green().bold(),
            HealthStatus::Degraded => label.yellow().bold(),
            HealthStatus::Down => label.red().bold(),
            HealthStatus::Unknown => label.dimmed(),
        }
    }
}

#[async_trait]
impl NotificationChannel for TerminalChannel {
    fn name(&self) -> &'static str {
        "terminal"
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError> {
        let suffix = if message.is_coalesced() {
            format!(" ({} transitions coalesced)", message.transitions).dimmed()
        } else {
            String::new().normal()
        };

        println!(
            "{} {} {} {} \u{2192} {}{}",
            message.timestamp.format("%H:%M:%S").to_string().dimmed(),
            message.to.symbol(),
            message.target_id.bold(),
            Self::status_badge(message.from),
            Self::status_badge(message.to),
            suffix
        );
        Ok(())
    }
}
