use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::check_kind::CheckKind;

/// A monitored endpoint with its resolved check configuration.
///
/// Targets are created by the registry at configuration load and stay
/// immutable for the lifetime of that registry; a reload produces a whole
/// new set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    /// Unique identifier, stable across reloads
    pub id: String,
    pub check: CheckKind,
    /// Time between two probe ticks
    pub interval: Duration,
    /// Upper bound on a single probe, enforced by the prober
    pub timeout: Duration,
    /// Consecutive failures before Healthy/Unknown degrades
    pub failure_threshold: u32,
    /// Consecutive failures before any state goes Down
    pub hard_failure_threshold: u32,
    /// Consecutive successes required to recover to Healthy
    pub recovery_threshold: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Target {
    /// Builds a target with thresholds matching the shipped defaults
    /// (3 failures to degrade, twice that to go down, 2 successes to
    /// recover). Mostly useful in tests and examples.
    #[must_use]
    pub fn new(id: impl Into<String>, check: CheckKind) -> Self {
        Self {
            id: id.into(),
            check,
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5),
            failure_threshold: 3,
            hard_failure_threshold: 6,
            recovery_threshold: 2,
            tags: Vec::new(),
        }
    }
}
