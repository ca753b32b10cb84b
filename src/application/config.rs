use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::entities::target::Target;
use crate::domain::registry::{ConfigError, TargetRegistry};
use crate::domain::value_objects::check_kind::CheckKind;

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Probe scheduling: concurrency bound and shutdown grace period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_probes: usize,
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

/// Alert delivery: retry policy and per-target cooldown window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

/// Per-target parameters a target entry can leave out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: u32,
}

/// Notification channels: JSON-lines log file and/or webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// State and alert storage path (tilde-expanded at point of use).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Alerts older than this are deleted on daemon start.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

/// One monitored target as written in the config file. Missing fields
/// fall back to `[defaults]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub id: String,
    pub check: CheckKind,
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub failure_threshold: Option<u32>,
    /// Defaults to twice the failure threshold when absent.
    #[serde(default)]
    pub hard_failure_threshold: Option<u32>,
    #[serde(default)]
    pub recovery_threshold: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// --- Defaults ---

const fn default_max_concurrent() -> usize {
    8
}

const fn default_grace_period() -> u64 {
    5
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_base_delay() -> u64 {
    500
}

const fn default_cooldown() -> u64 {
    60
}

fn default_database_path() -> String {
    "~/.local/share/remonitor/remonitor.db".into()
}

const fn default_retention_hours() -> u64 {
    // one week
    168
}

const fn default_interval() -> u64 {
    30
}

const fn default_timeout() -> u64 {
    5
}

const fn default_failure_threshold() -> u32 {
    3
}

const fn default_recovery_threshold() -> u32 {
    2
}

// --- Default impls ---

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_max_concurrent(),
            grace_period_secs: default_grace_period(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            cooldown_secs: default_cooldown(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            failure_threshold: default_failure_threshold(),
            recovery_threshold: default_recovery_threshold(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            retention_hours: default_retention_hours(),
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load config from the default path or create a default config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the file cannot be read, or the TOML content is invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_or_create(&path)
    }

    /// Load from a specific path, or create a default config file if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// invalid, or the default config file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to a specific path, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Default config file location under the user's config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("remonitor").join("config.toml"))
    }

    /// Resolve every target entry against `[defaults]`.
    #[must_use]
    pub fn resolve_targets(&self) -> Vec<Target> {
        self.targets
            .iter()
            .map(|entry| entry.resolve(&self.defaults))
            .collect()
    }

    /// Resolve and validate the full target set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any target fails registry validation.
    pub fn build_registry(&self) -> Result<TargetRegistry, ConfigError> {
        TargetRegistry::load(self.resolve_targets())
    }
}

impl TargetConfig {
    fn resolve(&self, defaults: &DefaultsConfig) -> Target {
        let failure_threshold = self.failure_threshold.unwrap_or(defaults.failure_threshold);
        Target {
            id: self.id.clone(),
            check: self.check.clone(),
            interval: Duration::from_secs(self.interval_secs.unwrap_or(defaults.interval_secs)),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(defaults.timeout_secs)),
            failure_threshold,
            hard_failure_threshold: self
                .hard_failure_threshold
                .unwrap_or(failure_threshold.saturating_mul(2)),
            recovery_threshold: self
                .recovery_threshold
                .unwrap_or(defaults.recovery_threshold),
            tags: self.tags.clone(),
        }
    }
}
