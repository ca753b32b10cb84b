use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::check::CheckResult;
use crate::domain::value_objects::health_status::HealthStatus;

/// Live health state of one target.
///
/// Exactly one instance exists per registered target, owned by the state
/// tracker and mutated only through the transition function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetState {
    pub target_id: String,
    pub status: HealthStatus,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub last_transition: Option<DateTime<Utc>>,
    pub last_result: Option<CheckResult>,
}

impl TargetState {
    #[must_use]
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            status: HealthStatus::Unknown,
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_transition: None,
            last_result: None,
        }
    }
}
