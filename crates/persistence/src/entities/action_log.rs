//! Action log entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ActionLogEntry, ActionType, DeviceKind, DeviceRef};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Database row mapping for the action_log table.
#[derive(Debug, Clone, FromRow)]
pub struct ActionLogEntity {
    pub id: i64,
    pub action_type: String,
    pub device_kind: String,
    pub device_id: i64,
    pub details: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl ActionLogEntity {
    /// Converts to the domain entry; `None` for rows written by a newer schema.
    pub fn into_entry(self) -> Option<ActionLogEntry> {
        let action = ActionType::parse(&self.action_type)?;
        let kind = DeviceKind::parse(&self.device_kind)?;
        Some(ActionLogEntry {
            action,
            device: DeviceRef {
                kind,
                id: self.device_id,
            },
            details: self.details,
            recorded_at: self.recorded_at,
        })
    }
}
