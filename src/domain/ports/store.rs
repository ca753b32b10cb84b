use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::alert::Alert;
use crate::domain::entities::state::TargetState;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write to store: {0}")]
    WriteFailed(String),
    #[error("failed to read from store: {0}")]
    ReadFailed(String),
}

/// Status surface over tracked target states.
///
/// The state tracker is the only writer.
pub trait StatusStore: Send + Sync {
    /// Persist the current state of one target.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn save_state(&self, state: &TargetState) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    fn get_state(&self, target_id: &str) -> Result<Option<TargetState>, StoreError>;

    /// All tracked states, ordered by target id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    fn all_states(&self) -> Result<Vec<TargetState>, StoreError>;

    /// Drop states for targets no longer registered.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn retain(&self, target_ids: &[String]) -> Result<(), StoreError>;
}

/// Record of dispatched alerts, delivered or terminally failed.
pub trait AlertStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn record_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Most recent alerts first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    fn recent_alerts(&self, count: usize) -> Result<Vec<Alert>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the read fails.
    fn alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError>;
}
