//! Message generation: the manual per-campaign call and the stage-entry
//! auto-trigger.
//!
//! ```text
//!   lead + stage name ─┐
//!                      ├─ lead_data ─ build_prompt ─▶ CompletionBackend
//!   campaign ──────────┘                                   │
//!                                        parse_completion ◀┘
//!                                               │
//!                                  generated_messages + activity_logs
//! ```
//!
//! Both paths build the same request for the same lead and campaign. They
//! differ in how failures are treated: manual generation surfaces provider
//! errors to the caller and stores a placeholder when the model returns
//! nothing usable, while the auto-trigger records a per-campaign failure and
//! moves on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use completion_client::{
    ChatMessage, ChatRequest, CompletionBackend, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use serde::Serialize;
use uuid::Uuid;

use crate::activity::{self, ActivityLog};
use crate::campaign::Campaign;
use crate::error::{LeadflowError, Result};
use crate::lead::Lead;
use crate::message::GeneratedMessage;
use crate::parse::parse_completion;
use crate::prompt::{build_prompt, lead_data, SYSTEM_PROMPT};
use crate::store::Store;
use crate::types::ActionType;

/// Model parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Result of a manual generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub messages: Vec<String>,
    pub generated_at: DateTime<Utc>,
    /// Id of the stored row; `None` when the insert failed.
    pub message_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResult {
    pub campaign_id: Uuid,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReport {
    /// No active campaign of the lead's workspace triggers on the stage.
    NoMatchingCampaigns,
    /// One entry per matching campaign, in campaign creation order.
    Processed(Vec<CampaignResult>),
}

impl TriggerReport {
    pub fn campaigns_processed(&self) -> usize {
        match self {
            TriggerReport::NoMatchingCampaigns => 0,
            TriggerReport::Processed(results) => results.len(),
        }
    }

    pub fn succeeded(&self) -> usize {
        match self {
            TriggerReport::NoMatchingCampaigns => 0,
            TriggerReport::Processed(results) => results.iter().filter(|r| r.success).count(),
        }
    }
}

#[derive(Clone)]
pub struct Generator {
    store: Arc<dyn Store>,
    backend: Arc<dyn CompletionBackend>,
    settings: GenerationSettings,
}

impl Generator {
    pub fn new(
        store: Arc<dyn Store>,
        backend: Arc<dyn CompletionBackend>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            store,
            backend,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// The chat request for `lead` under `campaign`, with the lead's stage
    /// shown as `stage_name`.
    pub fn request_for(&self, lead: &Lead, stage_name: Option<&str>, campaign: &Campaign) -> ChatRequest {
        let prompt = build_prompt(&lead_data(lead, stage_name), campaign);
        ChatRequest::new(
            self.settings.model.clone(),
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens)
    }

    async fn load_lead(&self, lead_id: Uuid) -> Result<Lead> {
        self.store
            .get_lead(lead_id)
            .await?
            .ok_or_else(|| LeadflowError::LeadNotFound(lead_id.to_string()))
    }

    async fn stage_name(&self, stage_id: Uuid) -> Result<Option<String>> {
        Ok(self.store.get_stage(stage_id).await?.map(|s| s.name))
    }

    /// Generate variants for one lead and campaign.
    ///
    /// Provider errors are returned. A model reply with nothing usable is
    /// stored and returned as the placeholder message. A failed insert is
    /// logged and the generated messages are still returned.
    pub async fn generate(
        &self,
        lead_id: Uuid,
        campaign_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<GenerationOutcome> {
        let lead = self.load_lead(lead_id).await?;
        let stage_name = self.stage_name(lead.stage_id).await?;
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .await?
            .filter(|c| c.workspace_id == lead.workspace_id)
            .ok_or_else(|| LeadflowError::CampaignNotFound(campaign_id.to_string()))?;

        let request = self.request_for(&lead, stage_name.as_deref(), &campaign);
        let content = self.backend.complete(&request).await?;
        let parsed = parse_completion(&content);
        tracing::debug!(%lead_id, %campaign_id, parse = parsed.kind(), "completion parsed");
        if !parsed.is_usable() {
            tracing::warn!(%lead_id, %campaign_id, "model returned no usable messages");
        }
        let messages = parsed.into_messages();

        let record = GeneratedMessage::new(lead.id, campaign.id, messages.clone());
        let message_id = match self.store.insert_generated_message(&record).await {
            Ok(()) => {
                activity::record(
                    self.store.as_ref(),
                    generated_activity(&record, &campaign, actor, "manual"),
                )
                .await;
                Some(record.id)
            }
            Err(e) => {
                tracing::error!(%lead_id, %campaign_id, error = %e, "failed to save generated messages");
                None
            }
        };

        tracing::info!(%lead_id, %campaign_id, variants = messages.len(), "messages generated");
        Ok(GenerationOutcome {
            messages,
            generated_at: Utc::now(),
            message_id,
        })
    }

    /// Generate for every active campaign that triggers on `new_stage_id`.
    ///
    /// Only a missing lead or a failed campaign lookup is an error. Each
    /// campaign then succeeds or fails on its own.
    pub async fn auto_trigger(&self, lead_id: Uuid, new_stage_id: Uuid) -> Result<TriggerReport> {
        let lead = self.load_lead(lead_id).await?;
        let campaigns = self
            .store
            .list_triggered_campaigns(lead.workspace_id, new_stage_id)
            .await?;
        if campaigns.is_empty() {
            tracing::info!(%lead_id, stage_id = %new_stage_id, "no campaign triggers on stage");
            return Ok(TriggerReport::NoMatchingCampaigns);
        }

        let stage_name = self.stage_name(new_stage_id).await?;
        let mut results = Vec::with_capacity(campaigns.len());
        for campaign in &campaigns {
            let success = match self.run_triggered(&lead, stage_name.as_deref(), campaign).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(%lead_id, campaign_id = %campaign.id, error = %e, "auto-generation failed");
                    false
                }
            };
            results.push(CampaignResult {
                campaign_id: campaign.id,
                success,
            });
        }

        let report = TriggerReport::Processed(results);
        tracing::info!(
            %lead_id,
            processed = report.campaigns_processed(),
            succeeded = report.succeeded(),
            "auto-trigger finished"
        );
        Ok(report)
    }

    async fn run_triggered(
        &self,
        lead: &Lead,
        stage_name: Option<&str>,
        campaign: &Campaign,
    ) -> Result<()> {
        let request = self.request_for(lead, stage_name, campaign);
        let content = self.backend.complete(&request).await?;
        let parsed = parse_completion(&content);
        if !parsed.is_usable() {
            return Err(LeadflowError::EmptyGeneration);
        }

        let record = GeneratedMessage::new(lead.id, campaign.id, parsed.into_messages());
        self.store.insert_generated_message(&record).await?;
        activity::record(
            self.store.as_ref(),
            generated_activity(&record, campaign, None, "auto"),
        )
        .await;
        Ok(())
    }

    /// Fire [`Generator::auto_trigger`] on a detached task. The caller does
    /// not wait and never sees the outcome; failures are logged.
    pub fn spawn_auto_trigger(&self, lead_id: Uuid, new_stage_id: Uuid) {
        let generator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = generator.auto_trigger(lead_id, new_stage_id).await {
                tracing::warn!(%lead_id, stage_id = %new_stage_id, error = %e, "auto-trigger failed");
            }
        });
    }
}

fn generated_activity(
    record: &GeneratedMessage,
    campaign: &Campaign,
    actor: Option<Uuid>,
    trigger: &str,
) -> ActivityLog {
    ActivityLog::new(record.lead_id, actor, ActionType::MessageGenerated)
        .detail("campaign_id", campaign.id.to_string())
        .detail("campaign_name", campaign.name.clone())
        .detail("message_id", record.id.to_string())
        .detail("variants", record.messages.len())
        .detail("trigger", trigger)
}
