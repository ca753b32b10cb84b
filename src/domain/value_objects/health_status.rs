use serde::{Deserialize, Serialize};

/// Health state of a monitored target.
///
/// Transitions between states are decided solely by the transition
/// function in [`crate::domain::state_machine`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No probe has settled the state yet
    #[default]
    Unknown,
    /// Target responds normally
    Healthy,
    /// Consecutive failures crossed the failure threshold
    Degraded,
    /// Consecutive failures crossed the hard threshold
    Down,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Degraded => write!(f, "DEGRADED"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

impl HealthStatus {
    #[must_use]
    pub const fn symbol(&self) -> &str {
        match self {
            Self::Unknown => "?",
            Self::Healthy => "\u{2713}",
            Self::Degraded => "\u{26a0}",
            Self::Down => "\u{2717}",
        }
    }

}
