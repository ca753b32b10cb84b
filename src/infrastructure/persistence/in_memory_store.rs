use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::entities::alert::Alert;
use crate::domain::entities::state::TargetState;
use crate::domain::ports::store::{AlertStore, StatusStore, StoreError};

/// In-memory store backing a single daemon process.
///
/// States and alerts live for the lifetime of the process; nothing is
/// persisted across restarts.
pub struct InMemoryStore {
    states: Mutex<HashMap<String, TargetState>>,
    alerts: Mutex<Vec<Alert>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore for InMemoryStore {
    fn save_state(&self, state: &TargetState) -> Result<(), StoreError> {
        self.states
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
            .insert(state.target_id.clone(), state.clone());
        Ok(())
    }

    fn get_state(&self, target_id: &str) -> Result<Option<TargetState>, StoreError> {
        Ok(self
            .states
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .get(target_id)
            .cloned())
    }

    fn all_states(&self) -> Result<Vec<TargetState>, StoreError> {
        let mut states: Vec<TargetState> = self
            .states
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .values()
            .cloned()
            .collect();
        states.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        Ok(states)
    }

    fn retain(&self, target_ids: &[String]) -> Result<(), StoreError> {
        self.states
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
            .retain(|id, _| target_ids.contains(id));
        Ok(())
    }
}

impl AlertStore for InMemoryStore {
    fn record_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
            .push(alert.clone());
        Ok(())
    }

    fn recent_alerts(&self, count: usize) -> Result<Vec<Alert>, StoreError> {
        let mut alerts = self
            .alerts
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .clone();
        alerts.reverse();
        alerts.truncate(count);
        Ok(alerts)
    }

    fn alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .iter()
            .filter(|a| a.timestamp >= since)
            .cloned()
            .collect();
        alerts.reverse();
        Ok(alerts)
    }
}
