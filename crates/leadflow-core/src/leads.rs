//! Lead lifecycle: creation, stage moves, edits and the board view.
//!
//! Every entry point that places a lead in a stage runs the stage's
//! required-field check first. Creation and moves also fire the stage
//! auto-trigger on a detached task.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::activity::{self, ActivityLog};
use crate::error::{LeadflowError, Result};
use crate::generation::Generator;
use crate::lead::{Lead, LeadPatch, NewLead};
use crate::message::GeneratedMessage;
use crate::stage::FunnelStage;
use crate::store::Store;
use crate::types::ActionType;
use crate::validation::{validate_lead_patch, validate_new_lead, validate_stage_move};

/// One column of the board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub stage: FunnelStage,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub lead: Lead,
    /// False when the lead already was in the destination stage.
    pub moved: bool,
}

#[derive(Clone)]
pub struct LeadService {
    generator: Generator,
    auto_trigger: bool,
}

impl LeadService {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            auto_trigger: true,
        }
    }

    /// Disable the background auto-trigger after creates and moves.
    pub fn without_auto_trigger(mut self) -> Self {
        self.auto_trigger = false;
        self
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    fn store(&self) -> &dyn Store {
        self.generator.store().as_ref()
    }

    pub async fn ensure_workspace(&self, workspace_id: Uuid) -> Result<()> {
        match self.store().get_workspace(workspace_id).await? {
            Some(_) => Ok(()),
            None => Err(LeadflowError::WorkspaceNotFound(workspace_id.to_string())),
        }
    }

    /// Load a stage and check that it belongs to `workspace_id`.
    pub async fn workspace_stage(&self, workspace_id: Uuid, stage_id: Uuid) -> Result<FunnelStage> {
        let stage = self
            .store()
            .get_stage(stage_id)
            .await?
            .ok_or_else(|| LeadflowError::StageNotFound(stage_id.to_string()))?;
        if stage.workspace_id != workspace_id {
            return Err(LeadflowError::StageOutsideWorkspace {
                stage: stage_id.to_string(),
                workspace: workspace_id.to_string(),
            });
        }
        Ok(stage)
    }

    /// Load a lead, treating one from another workspace as absent.
    pub async fn workspace_lead(&self, workspace_id: Uuid, lead_id: Uuid) -> Result<Lead> {
        self.store()
            .get_lead(lead_id)
            .await?
            .filter(|l| l.workspace_id == workspace_id)
            .ok_or_else(|| LeadflowError::LeadNotFound(lead_id.to_string()))
    }

    pub async fn create_lead(
        &self,
        workspace_id: Uuid,
        input: NewLead,
        actor: Option<Uuid>,
    ) -> Result<Lead> {
        validate_new_lead(&input)?;
        self.ensure_workspace(workspace_id).await?;
        let stage_id = input
            .stage_id
            .ok_or_else(|| LeadflowError::InvalidLead("Etapa é obrigatória".into()))?;
        let stage = self.workspace_stage(workspace_id, stage_id).await?;

        let lead = input.into_lead(workspace_id, stage.id);
        validate_stage_move(&lead, &stage)?;
        self.store().insert_lead(&lead).await?;

        activity::record(
            self.store(),
            ActivityLog::new(lead.id, actor, ActionType::LeadCreated)
                .detail("stage_id", stage.id.to_string())
                .detail("stage_name", stage.name.clone()),
        )
        .await;
        tracing::info!(lead_id = %lead.id, stage = %stage.name, "lead created");

        self.fire_trigger(&lead, stage.id).await;
        Ok(lead)
    }

    /// Move a lead to `stage_id`. The destination's required fields must all
    /// be filled; a rejected move leaves the lead untouched.
    pub async fn move_lead(
        &self,
        workspace_id: Uuid,
        lead_id: Uuid,
        stage_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<MoveOutcome> {
        let mut lead = self.workspace_lead(workspace_id, lead_id).await?;
        if lead.stage_id == stage_id {
            return Ok(MoveOutcome { lead, moved: false });
        }
        let to = self.workspace_stage(workspace_id, stage_id).await?;
        let from_name = self
            .store()
            .get_stage(lead.stage_id)
            .await?
            .map(|s| s.name)
            .unwrap_or_default();

        let from_id = lead.stage_id;
        lead.stage_id = to.id;
        validate_stage_move(&lead, &to)?;
        lead.updated_at = Utc::now();
        self.store().update_lead(&lead).await?;

        activity::record(
            self.store(),
            ActivityLog::new(lead.id, actor, ActionType::StageChanged)
                .detail("from_stage", from_name.clone())
                .detail("to_stage", to.name.clone())
                .detail("from_stage_id", from_id.to_string())
                .detail("to_stage_id", to.id.to_string()),
        )
        .await;
        tracing::info!(lead_id = %lead.id, from = %from_name, to = %to.name, "lead moved");

        self.fire_trigger(&lead, to.id).await;
        Ok(MoveOutcome { lead, moved: true })
    }

    /// Apply a partial edit. The result must still satisfy the current
    /// stage's required fields.
    pub async fn update_lead(
        &self,
        workspace_id: Uuid,
        lead_id: Uuid,
        patch: LeadPatch,
        actor: Option<Uuid>,
    ) -> Result<Lead> {
        validate_lead_patch(&patch)?;
        let mut lead = self.workspace_lead(workspace_id, lead_id).await?;
        let changed = lead.apply(patch);
        if changed.is_empty() {
            return Ok(lead);
        }
        let stage = self.workspace_stage(workspace_id, lead.stage_id).await?;
        validate_stage_move(&lead, &stage)?;
        self.store().update_lead(&lead).await?;

        activity::record(
            self.store(),
            ActivityLog::new(lead.id, actor, ActionType::LeadUpdated).detail("fields", changed),
        )
        .await;
        Ok(lead)
    }

    /// Stages in board order, each with its leads in creation order.
    pub async fn board(&self, workspace_id: Uuid) -> Result<Vec<BoardColumn>> {
        self.ensure_workspace(workspace_id).await?;
        let stages = self.store().list_stages(workspace_id).await?;
        let mut leads = self.store().list_leads(workspace_id).await?;

        let mut columns = Vec::with_capacity(stages.len());
        for stage in stages {
            let (mine, rest): (Vec<_>, Vec<_>) =
                leads.into_iter().partition(|l| l.stage_id == stage.id);
            leads = rest;
            columns.push(BoardColumn { stage, leads: mine });
        }
        if !leads.is_empty() {
            tracing::warn!(%workspace_id, orphaned = leads.len(), "leads reference unknown stages");
        }
        Ok(columns)
    }

    /// Record that variant `variant` of one of the lead's generated messages
    /// was sent. A message generated for another lead counts as absent.
    pub async fn mark_message_sent(
        &self,
        workspace_id: Uuid,
        lead_id: Uuid,
        message_id: Uuid,
        variant: usize,
        actor: Option<Uuid>,
    ) -> Result<GeneratedMessage> {
        let lead = self.workspace_lead(workspace_id, lead_id).await?;
        let message = self
            .store()
            .get_generated_message(message_id)
            .await?
            .filter(|m| m.lead_id == lead.id)
            .ok_or_else(|| LeadflowError::MessageNotFound(message_id.to_string()))?;
        if message.variant(variant).is_none() {
            return Err(LeadflowError::InvalidVariant { index: variant });
        }

        let updated = self
            .store()
            .mark_message_sent(message_id, Utc::now())
            .await?
            .ok_or_else(|| LeadflowError::MessageNotFound(message_id.to_string()))?;

        activity::record(
            self.store(),
            ActivityLog::new(updated.lead_id, actor, ActionType::MessageSent)
                .detail("message_id", updated.id.to_string())
                .detail("campaign_id", updated.campaign_id.to_string())
                .detail("variant", variant),
        )
        .await;
        Ok(updated)
    }

    async fn fire_trigger(&self, lead: &Lead, stage_id: Uuid) {
        if !self.auto_trigger {
            return;
        }
        match self
            .store()
            .list_triggered_campaigns(lead.workspace_id, stage_id)
            .await
        {
            Ok(campaigns) if campaigns.is_empty() => {}
            Ok(_) => self.generator.spawn_auto_trigger(lead.id, stage_id),
            Err(e) => tracing::warn!(lead_id = %lead.id, error = %e, "could not look up triggered campaigns"),
        }
    }
}
