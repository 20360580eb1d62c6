//! Persistence boundary.
//!
//! Services take an `Arc<dyn Store>` so the same code runs against Postgres
//! in production and the in-process [`memory::MemoryStore`] in tests and demo
//! mode. Lookups return `Ok(None)` for a missing row; turning that into a
//! not-found error is the caller's decision.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::campaign::Campaign;
use crate::error::Result;
use crate::lead::Lead;
use crate::message::GeneratedMessage;
use crate::stage::{CustomField, FunnelStage};
use crate::workspace::{Workspace, WorkspaceInvite, WorkspaceMember};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // Workspaces ----------------------------------------------------------

    async fn insert_workspace(&self, workspace: &Workspace) -> Result<()>;
    async fn get_workspace(&self, id: Uuid) -> Result<Option<Workspace>>;
    async fn insert_member(&self, member: &WorkspaceMember) -> Result<()>;
    async fn list_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>>;
    async fn insert_invite(&self, invite: &WorkspaceInvite) -> Result<()>;
    async fn find_invite(&self, token: &str) -> Result<Option<WorkspaceInvite>>;
    async fn update_invite(&self, invite: &WorkspaceInvite) -> Result<()>;

    // Stages and custom fields ---------------------------------------------

    async fn insert_stage(&self, stage: &FunnelStage) -> Result<()>;
    async fn get_stage(&self, id: Uuid) -> Result<Option<FunnelStage>>;
    /// Stages of a workspace in board order.
    async fn list_stages(&self, workspace_id: Uuid) -> Result<Vec<FunnelStage>>;
    /// Replace a stage's `required_fields`. Returns the updated stage, or
    /// `None` when it does not exist.
    async fn set_required_fields(
        &self,
        stage_id: Uuid,
        fields: &[String],
    ) -> Result<Option<FunnelStage>>;
    async fn insert_custom_field(&self, field: &CustomField) -> Result<()>;
    async fn list_custom_fields(&self, workspace_id: Uuid) -> Result<Vec<CustomField>>;

    // Leads -----------------------------------------------------------------

    async fn insert_lead(&self, lead: &Lead) -> Result<()>;
    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>>;
    async fn update_lead(&self, lead: &Lead) -> Result<()>;
    async fn list_leads(&self, workspace_id: Uuid) -> Result<Vec<Lead>>;

    // Campaigns -------------------------------------------------------------

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<()>;
    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>>;
    async fn update_campaign(&self, campaign: &Campaign) -> Result<()>;
    async fn list_campaigns(&self, workspace_id: Uuid) -> Result<Vec<Campaign>>;
    /// Active campaigns of `workspace_id` whose trigger stage is `stage_id`,
    /// oldest first.
    async fn list_triggered_campaigns(
        &self,
        workspace_id: Uuid,
        stage_id: Uuid,
    ) -> Result<Vec<Campaign>>;

    // Generated messages ----------------------------------------------------

    async fn insert_generated_message(&self, message: &GeneratedMessage) -> Result<()>;
    async fn get_generated_message(&self, id: Uuid) -> Result<Option<GeneratedMessage>>;
    async fn mark_message_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<GeneratedMessage>>;
    /// Newest first.
    async fn list_generated_messages(&self, lead_id: Uuid) -> Result<Vec<GeneratedMessage>>;

    // Activity --------------------------------------------------------------

    async fn insert_activity(&self, entry: &ActivityLog) -> Result<()>;
    /// Oldest first.
    async fn list_activity(&self, lead_id: Uuid) -> Result<Vec<ActivityLog>>;
}
