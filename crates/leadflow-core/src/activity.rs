use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::store::Store;
use crate::types::ActionType;

/// Append-only audit entry for something that happened to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub lead_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub action_type: ActionType,
    #[serde(default)]
    pub details: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(lead_id: Uuid, user_id: Option<Uuid>, action_type: ActionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            user_id,
            action_type,
            details: Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Append `entry`, logging instead of failing: an audit write never aborts
/// the operation it describes.
pub async fn record(store: &dyn Store, entry: ActivityLog) {
    let action = entry.action_type;
    let lead_id = entry.lead_id;
    if let Err(e) = store.insert_activity(&entry).await {
        tracing::warn!(%lead_id, %action, error = %e, "failed to record activity");
    }
}
