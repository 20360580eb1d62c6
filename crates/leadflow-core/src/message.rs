use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output of one generation call: the ordered variants produced for a
/// lead/campaign pair. Every call creates a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub campaign_id: Uuid,
    pub messages: Vec<String>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedMessage {
    pub fn new(lead_id: Uuid, campaign_id: Uuid, messages: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            campaign_id,
            messages,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    pub fn variant(&self, index: usize) -> Option<&str> {
        self.messages.get(index).map(String::as_str)
    }
}
