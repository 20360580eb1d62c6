use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeadflowError, Result};

/// Reusable prompt template. When `trigger_stage_id` is set and the campaign
/// is active, leads entering that stage get messages generated automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub context: String,
    pub prompt: String,
    #[serde(default)]
    pub trigger_stage_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        workspace_id: Uuid,
        name: impl Into<String>,
        context: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: name.into(),
            context: context.into(),
            prompt: prompt.into(),
            trigger_stage_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn triggered_by(mut self, stage_id: Uuid) -> Self {
        self.trigger_stage_id = Some(stage_id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn fires_on(&self, stage_id: Uuid) -> bool {
        self.is_active && self.trigger_stage_id == Some(stage_id)
    }

    pub fn apply(&mut self, patch: CampaignPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(context) = patch.context {
            self.context = context;
        }
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(trigger) = patch.trigger_stage_id {
            self.trigger_stage_id = trigger;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewCampaign {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub trigger_stage_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewCampaign {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LeadflowError::InvalidCampaign("Nome é obrigatório".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(LeadflowError::InvalidCampaign("Prompt é obrigatório".into()));
        }
        Ok(())
    }

    pub fn into_campaign(self, workspace_id: Uuid) -> Campaign {
        let mut campaign = Campaign::new(workspace_id, self.name.trim(), self.context, self.prompt);
        campaign.trigger_stage_id = self.trigger_stage_id;
        campaign.is_active = self.is_active;
        campaign
    }
}

/// Partial update. `trigger_stage_id: Some(None)` clears the trigger, which
/// is how a JSON `null` arrives through [`double_option`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CampaignPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub trigger_stage_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CampaignPatch {
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(LeadflowError::InvalidCampaign("Nome é obrigatório".into()));
        }
        if self.prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(LeadflowError::InvalidCampaign("Prompt é obrigatório".into()));
        }
        Ok(())
    }
}

/// Distinguish an absent key (outer `None`, via `#[serde(default)]`) from an
/// explicit `null` (`Some(None)`).
fn double_option<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}
