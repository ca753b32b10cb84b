use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::delivery_status::DeliveryStatus;
use crate::domain::value_objects::health_status::HealthStatus;

/// A confirmed status change for one target.
///
/// Produced by the state tracker if and only if the status actually
/// changed; this is the single source of alert-worthy events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transition {
    pub target_id: String,
    pub from: HealthStatus,
    pub to: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

/// An alert tracked through its delivery lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub target_id: String,
    pub from: HealthStatus,
    pub to: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub attempts: u32,
    pub delivery: DeliveryStatus,
}

impl Alert {
    #[must_use]
    pub fn from_transition(transition: &Transition) -> Self {
        Self {
            target_id: transition.target_id.clone(),
            from: transition.from,
            to: transition.to,
            timestamp: transition.timestamp,
            attempts: 0,
            delivery: DeliveryStatus::Pending,
        }
    }
}

/// The outbound payload handed to notification channels.
///
/// When the dispatcher coalesces several rapid transitions inside a
/// cooldown window, `transitions` counts them and `from`/`to` describe
/// the net change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertMessage {
    pub target_id: String,
    pub from: HealthStatus,
    pub to: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub transitions: u32,
}

impl AlertMessage {
    #[must_use]
    pub fn from_transition(transition: &Transition) -> Self {
        Self {
            target_id: transition.target_id.clone(),
            from: transition.from,
            to: transition.to,
            timestamp: transition.timestamp,
            transitions: 1,
        }
    }

    /// Whether this message summarizes more than one transition.
    #[must_use]
    pub const fn is_coalesced(&self) -> bool {
        self.transitions > 1
    }
}

impl std::fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_coalesced() {
            write!(
                f,
                "{}: {} -> {} ({} transitions coalesced)",
                self.target_id, self.from, self.to, self.transitions
            )
        } else {
            write!(f, "{}: {} -> {}", self.target_id, self.from, self.to)
        }
    }
}
