use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::entities::alert::AlertMessage;
use crate::domain::ports::channel::{ChannelError, NotificationChannel};

const DEFAULT_LOG_PATH: &str = "~/.local/share/remonitor/alerts.log";

/// Appends alerts as JSON lines to a local file.
pub struct LogFileChannel {
    path: PathBuf,
}

impl LogFileChannel {
    #[must_use]
    pub fn new(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
        }
    }

    fn append_json_line(&self, value: &serde_json::Value) -> Result<(), ChannelError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChannelError::SendFailed(format!("cannot create parent directory: {e}"))
            })?;
        }

        let json = serde_json::to_string(value)
            .map_err(|e| ChannelError::SendFailed(format!("JSON serialization error: {e}")))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ChannelError::SendFailed(format!("cannot open log file: {e}")))?;

        writeln!(file, "{json}")
            .map_err(|e| ChannelError::SendFailed(format!("cannot write to log file: {e}")))
    }
}

impl Default for LogFileChannel {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

#[async_trait]
impl NotificationChannel for LogFileChannel {
    fn name(&self) -> &'static str {
        "log_file"
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), ChannelError> {
        let entry = serde_json::json!({
            "timestamp": message.timestamp.to_rfc3339(),
            "target": message.target_id,
            "from": format!("{}", message.from),
            "to": format!("{}", message.to),
            "transitions": message.transitions,
        });

        self.append_json_line(&entry)
    }
}
