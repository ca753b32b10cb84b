use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::probe_error::ProbeErrorKind;

/// Detail attached to a failed probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: ProbeErrorKind,
    pub detail: String,
}

/// Outcome of a single probe against a target.
///
/// Immutable observation: produced by the prober, consumed once by the
/// state tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub target_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub latency: Duration,
    pub error: Option<ProbeFailure>,
}

impl CheckResult {
    #[must_use]
    pub fn success(target_id: impl Into<String>, latency: Duration) -> Self {
        Self {
            target_id: target_id.into(),
            timestamp: Utc::now(),
            success: true,
            latency,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(
        target_id: impl Into<String>,
        latency: Duration,
        kind: ProbeErrorKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            timestamp: Utc::now(),
            success: false,
            latency,
            error: Some(ProbeFailure {
                kind,
                detail: detail.into(),
            }),
        }
    }
}
