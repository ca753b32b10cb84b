use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, params_from_iter};

use crate::domain::entities::alert::Alert;
use crate::domain::entities::state::TargetState;
use crate::domain::ports::store::{AlertStore, StatusStore, StoreError};
use crate::domain::value_objects::delivery_status::DeliveryStatus;
use crate::domain::value_objects::health_status::HealthStatus;

use super::migrations;

/// SQLite-backed store for target states and dispatched alerts.
///
/// Survives daemon restarts, so the `status` command can read what a
/// running daemon wrote.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new `SQLite` store at the given path.
    ///
    /// Expands `~`, creates parent directories, opens connection,
    /// sets WAL mode and pragmas, and initializes schema.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the database cannot be opened or initialized.
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let expanded = shellexpand::tilde(path);
        let db_path = PathBuf::from(expanded.as_ref());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        let conn =
            Connection::open(&db_path).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        migrations::initialize_schema(&conn).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Remove alerts older than the given retention period.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if deletion fails.
    pub fn cleanup_old(&self, retention_hours: u64) -> Result<(), StoreError> {
        let hours =
            i64::try_from(retention_hours).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        let delta = chrono::TimeDelta::try_hours(hours)
            .ok_or_else(|| StoreError::WriteFailed("invalid retention hours".into()))?;
        let cutoff = (Utc::now() - delta).to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        conn.execute("DELETE FROM alerts WHERE created_at < ?1", params![cutoff])
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }
}

fn enum_to_str<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    let json = serde_json::to_string(value).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
    Ok(json.trim_matches('"').to_string())
}

fn parse_alert_row(row: &rusqlite::Row<'_>) -> Result<Alert, rusqlite::Error> {
    let created_at: String = row.get(0)?;
    let target_id: String = row.get(1)?;
    let from_str: String = row.get(2)?;
    let to_str: String = row.get(3)?;
    let attempts: u32 = row.get(4)?;
    let delivery_str: String = row.get(5)?;

    let timestamp = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let from: HealthStatus = serde_json::from_str(&format!("\"{from_str}\"")).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let to: HealthStatus = serde_json::from_str(&format!("\"{to_str}\"")).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let delivery: DeliveryStatus =
        serde_json::from_str(&format!("\"{delivery_str}\"")).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Alert {
        target_id,
        from,
        to,
        timestamp,
        attempts,
        delivery,
    })
}

fn parse_state_row(row: &rusqlite::Row<'_>) -> Result<TargetState, rusqlite::Error> {
    let data: String = row.get(0)?;
    serde_json::from_str(&data).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl StatusStore for SqliteStore {
    fn save_state(&self, state: &TargetState) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(state).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        conn.execute(
            "INSERT INTO states (target_id, updated_at, data) VALUES (?1, ?2, ?3) \
             ON CONFLICT(target_id) DO UPDATE SET updated_at = ?2, data = ?3",
            params![state.target_id, Utc::now().to_rfc3339(), data],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }

    fn get_state(&self, target_id: &str) -> Result<Option<TargetState>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let result = conn.query_row(
            "SELECT data FROM states WHERE target_id = ?1",
            params![target_id],
            parse_state_row,
        );

        drop(conn);

        match result {
            Ok(state) => Ok(Some(state)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::ReadFailed(e.to_string())),
        }
    }

    fn all_states(&self) -> Result<Vec<TargetState>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare("SELECT data FROM states ORDER BY target_id")
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let states = stmt
            .query_map([], parse_state_row)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(states)
    }

    fn retain(&self, target_ids: &[String]) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        if target_ids.is_empty() {
            conn.execute("DELETE FROM states", [])
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        } else {
            let placeholders = vec!["?"; target_ids.len()].join(", ");
            conn.execute(
                &format!("DELETE FROM states WHERE target_id NOT IN ({placeholders})"),
                params_from_iter(target_ids),
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        drop(conn);
        Ok(())
    }
}

impl AlertStore for SqliteStore {
    fn record_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        let from = enum_to_str(&alert.from)?;
        let to = enum_to_str(&alert.to)?;
        let delivery = enum_to_str(&alert.delivery)?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        conn.execute(
            "INSERT INTO alerts (created_at, target_id, from_status, to_status, attempts, delivery) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alert.timestamp.to_rfc3339(),
                alert.target_id,
                from,
                to,
                alert.attempts,
                delivery,
            ],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }

    fn recent_alerts(&self, count: usize) -> Result<Vec<Alert>, StoreError> {
        let limit = i64::try_from(count).map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(
                "SELECT created_at, target_id, from_status, to_status, attempts, delivery \
                 FROM alerts ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let alerts = stmt
            .query_map(params![limit], parse_alert_row)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(alerts)
    }

    fn alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(
                "SELECT created_at, target_id, from_status, to_status, attempts, delivery \
                 FROM alerts WHERE created_at >= ?1 ORDER BY id DESC",
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let alerts = stmt
            .query_map(params![since.to_rfc3339()], parse_alert_row)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(alerts)
    }
}
