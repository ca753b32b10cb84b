use std::collections::HashMap;

use thiserror::Error;

use crate::domain::entities::target::Target;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate target id: {0}")]
    DuplicateTarget(String),
    #[error("target {0}: interval must be greater than zero")]
    InvalidInterval(String),
    #[error("target {0}: timeout must be greater than zero")]
    InvalidTimeout(String),
    #[error("target {target}: {detail}")]
    InvalidThreshold { target: String, detail: String },
}

/// The validated, read-only set of monitored targets.
///
/// Built once from configuration; a reload builds a whole new registry
/// and swaps it in atomically — nothing mutates an existing one.
#[derive(Debug)]
pub struct TargetRegistry {
    targets: Vec<Target>,
    index: HashMap<String, usize>,
}

impl TargetRegistry {
    /// Validates and indexes a set of targets.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on duplicate ids, zero intervals or timeouts,
    /// zero thresholds, or a hard threshold below the failure threshold.
    pub fn load(targets: Vec<Target>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(targets.len());
        for (position, target) in targets.iter().enumerate() {
            if index.insert(target.id.clone(), position).is_some() {
                return Err(ConfigError::DuplicateTarget(target.id.clone()));
            }
            if target.interval.is_zero() {
                return Err(ConfigError::InvalidInterval(target.id.clone()));
            }
            if target.timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout(target.id.clone()));
            }
            if target.failure_threshold == 0 {
                return Err(ConfigError::InvalidThreshold {
                    target: target.id.clone(),
                    detail: "failure_threshold must be at least 1".to_string(),
                });
            }
            if target.recovery_threshold == 0 {
                return Err(ConfigError::InvalidThreshold {
                    target: target.id.clone(),
                    detail: "recovery_threshold must be at least 1".to_string(),
                });
            }
            if target.hard_failure_threshold < target.failure_threshold {
                return Err(ConfigError::InvalidThreshold {
                    target: target.id.clone(),
                    detail: format!(
                        "hard_failure_threshold ({}) below failure_threshold ({})",
                        target.hard_failure_threshold, target.failure_threshold
                    ),
                });
            }
        }
        Ok(Self { targets, index })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Target> {
        self.index.get(id).map(|&position| &self.targets[position])
    }

    /// All targets in registration order.
    #[must_use]
    pub fn all(&self) -> &[Target] {
        &self.targets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
