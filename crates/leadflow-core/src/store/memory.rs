use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::activity::ActivityLog;
use crate::campaign::Campaign;
use crate::error::{LeadflowError, Result};
use crate::lead::Lead;
use crate::message::GeneratedMessage;
use crate::stage::{sort_stages, CustomField, FunnelStage};
use crate::workspace::{Workspace, WorkspaceInvite, WorkspaceMember};

#[derive(Default)]
struct Tables {
    workspaces: Vec<Workspace>,
    members: Vec<WorkspaceMember>,
    invites: Vec<WorkspaceInvite>,
    stages: Vec<FunnelStage>,
    custom_fields: Vec<CustomField>,
    leads: Vec<Lead>,
    campaigns: Vec<Campaign>,
    messages: Vec<GeneratedMessage>,
    activity: Vec<ActivityLog>,
}

/// In-process store. Rows are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_message_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert_generated_message` fail.
    pub fn fail_message_inserts(&self, fail: bool) {
        self.fail_message_inserts.store(fail, Ordering::SeqCst);
    }
}

fn replace<T>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool, what: &str) -> Result<()>
where
    T: Clone,
{
    match rows.iter_mut().find(|r| same(r)) {
        Some(slot) => {
            *slot = row.clone();
            Ok(())
        }
        None => Err(LeadflowError::StoreFault(format!("{what} inexistente"))),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_workspace(&self, workspace: &Workspace) -> Result<()> {
        self.tables.write().await.workspaces.push(workspace.clone());
        Ok(())
    }

    async fn get_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        let t = self.tables.read().await;
        Ok(t.workspaces.iter().find(|w| w.id == id).cloned())
    }

    async fn insert_member(&self, member: &WorkspaceMember) -> Result<()> {
        let mut t = self.tables.write().await;
        t.members
            .retain(|m| !(m.workspace_id == member.workspace_id && m.user_id == member.user_id));
        t.members.push(member.clone());
        Ok(())
    }

    async fn list_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>> {
        let t = self.tables.read().await;
        Ok(t.members
            .iter()
            .filter(|m| m.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn insert_invite(&self, invite: &WorkspaceInvite) -> Result<()> {
        self.tables.write().await.invites.push(invite.clone());
        Ok(())
    }

    async fn find_invite(&self, token: &str) -> Result<Option<WorkspaceInvite>> {
        let t = self.tables.read().await;
        Ok(t.invites.iter().find(|i| i.token == token).cloned())
    }

    async fn update_invite(&self, invite: &WorkspaceInvite) -> Result<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.invites, invite, |i| i.id == invite.id, "convite")
    }

    async fn insert_stage(&self, stage: &FunnelStage) -> Result<()> {
        self.tables.write().await.stages.push(stage.clone());
        Ok(())
    }

    async fn get_stage(&self, id: Uuid) -> Result<Option<FunnelStage>> {
        let t = self.tables.read().await;
        Ok(t.stages.iter().find(|s| s.id == id).cloned())
    }

    async fn list_stages(&self, workspace_id: Uuid) -> Result<Vec<FunnelStage>> {
        let t = self.tables.read().await;
        let mut stages: Vec<_> = t
            .stages
            .iter()
            .filter(|s| s.workspace_id == workspace_id)
            .cloned()
            .collect();
        sort_stages(&mut stages);
        Ok(stages)
    }

    async fn set_required_fields(
        &self,
        stage_id: Uuid,
        fields: &[String],
    ) -> Result<Option<FunnelStage>> {
        let mut t = self.tables.write().await;
        Ok(t.stages.iter_mut().find(|s| s.id == stage_id).map(|s| {
            s.required_fields = fields.to_vec();
            s.clone()
        }))
    }

    async fn insert_custom_field(&self, field: &CustomField) -> Result<()> {
        self.tables.write().await.custom_fields.push(field.clone());
        Ok(())
    }

    async fn list_custom_fields(&self, workspace_id: Uuid) -> Result<Vec<CustomField>> {
        let t = self.tables.read().await;
        Ok(t.custom_fields
            .iter()
            .filter(|f| f.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<()> {
        self.tables.write().await.leads.push(lead.clone());
        Ok(())
    }

    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
        let t = self.tables.read().await;
        Ok(t.leads.iter().find(|l| l.id == id).cloned())
    }

    async fn update_lead(&self, lead: &Lead) -> Result<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.leads, lead, |l| l.id == lead.id, "lead")
    }

    async fn list_leads(&self, workspace_id: Uuid) -> Result<Vec<Lead>> {
        let t = self.tables.read().await;
        Ok(t.leads
            .iter()
            .filter(|l| l.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        self.tables.write().await.campaigns.push(campaign.clone());
        Ok(())
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>> {
        let t = self.tables.read().await;
        Ok(t.campaigns.iter().find(|c| c.id == id).cloned())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<()> {
        let mut t = self.tables.write().await;
        replace(&mut t.campaigns, campaign, |c| c.id == campaign.id, "campanha")
    }

    async fn list_campaigns(&self, workspace_id: Uuid) -> Result<Vec<Campaign>> {
        let t = self.tables.read().await;
        Ok(t.campaigns
            .iter()
            .filter(|c| c.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn list_triggered_campaigns(
        &self,
        workspace_id: Uuid,
        stage_id: Uuid,
    ) -> Result<Vec<Campaign>> {
        let t = self.tables.read().await;
        Ok(t.campaigns
            .iter()
            .filter(|c| c.workspace_id == workspace_id && c.fires_on(stage_id))
            .cloned()
            .collect())
    }

    async fn insert_generated_message(&self, message: &GeneratedMessage) -> Result<()> {
        if self.fail_message_inserts.load(Ordering::SeqCst) {
            return Err(LeadflowError::StoreFault(
                "inserção em generated_messages recusada".into(),
            ));
        }
        self.tables.write().await.messages.push(message.clone());
        Ok(())
    }

    async fn get_generated_message(&self, id: Uuid) -> Result<Option<GeneratedMessage>> {
        let t = self.tables.read().await;
        Ok(t.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn mark_message_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<GeneratedMessage>> {
        let mut t = self.tables.write().await;
        Ok(t.messages.iter_mut().find(|m| m.id == id).map(|m| {
            m.sent_at = Some(sent_at);
            m.clone()
        }))
    }

    async fn list_generated_messages(&self, lead_id: Uuid) -> Result<Vec<GeneratedMessage>> {
        let t = self.tables.read().await;
        Ok(t.messages
            .iter()
            .rev()
            .filter(|m| m.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn insert_activity(&self, entry: &ActivityLog) -> Result<()> {
        self.tables.write().await.activity.push(entry.clone());
        Ok(())
    }

    async fn list_activity(&self, lead_id: Uuid) -> Result<Vec<ActivityLog>> {
        let t = self.tables.read().await;
        Ok(t.activity
            .iter()
            .filter(|a| a.lead_id == lead_id)
            .cloned()
            .collect())
    }
}
