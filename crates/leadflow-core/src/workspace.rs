use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeadflowError, Result};
use crate::stage::FunnelStage;
use crate::store::Store;
use crate::types::MemberRole;

const INVITE_TOKEN_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// Tenant boundary. Leads, stages, campaigns and custom fields all belong to
/// exactly one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl WorkspaceMember {
    pub fn new(workspace_id: Uuid, user_id: Uuid, role: MemberRole) -> Self {
        Self {
            workspace_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

// ---------------------------------------------------------------------------
// WorkspaceInvite
// ---------------------------------------------------------------------------

/// Token-bearing invitation. Valid until `expires_at`, consumed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInvite {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub token: String,
    pub invited_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WorkspaceInvite {
    pub fn issue(
        workspace_id: Uuid,
        email: impl Into<String>,
        role: MemberRole,
        invited_by: Option<Uuid>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(INVITE_TOKEN_LEN)
            .map(char::from)
            .collect();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            email: email.into().trim().to_lowercase(),
            role,
            token,
            invited_by,
            expires_at: now + ttl,
            accepted_at: None,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.accepted_at.is_some()
    }

    /// Consume the invite for `user_id`, yielding the membership it grants.
    pub fn accept(&mut self, user_id: Uuid, now: DateTime<Utc>) -> Result<WorkspaceMember> {
        if self.is_consumed() {
            return Err(LeadflowError::InvalidInvite("já utilizado".into()));
        }
        if self.is_expired(now) {
            return Err(LeadflowError::InvalidInvite("expirado".into()));
        }
        self.accepted_at = Some(now);
        Ok(WorkspaceMember {
            workspace_id: self.workspace_id,
            user_id,
            role: self.role,
            joined_at: now,
        })
    }
}

// ---------------------------------------------------------------------------
// Store-backed operations
// ---------------------------------------------------------------------------

/// Stages every new workspace starts with, in board order.
pub const DEFAULT_STAGES: &[&str] = &["Novo", "Contato", "Proposta", "Negociação", "Fechado"];

/// Create a workspace owned by `owner` (as admin) with the default funnel.
pub async fn create_workspace(
    store: &dyn Store,
    name: &str,
    owner: Uuid,
) -> Result<(Workspace, Vec<FunnelStage>)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LeadflowError::InvalidWorkspace("Nome do workspace é obrigatório".into()));
    }
    let workspace = Workspace::new(name);
    store.insert_workspace(&workspace).await?;
    store
        .insert_member(&WorkspaceMember::new(workspace.id, owner, MemberRole::Admin))
        .await?;

    let mut stages = Vec::with_capacity(DEFAULT_STAGES.len());
    for (i, stage_name) in DEFAULT_STAGES.iter().enumerate() {
        let stage = FunnelStage::new(workspace.id, *stage_name, i as i32 + 1);
        store.insert_stage(&stage).await?;
        stages.push(stage);
    }
    tracing::info!(workspace_id = %workspace.id, %name, "workspace created");
    Ok((workspace, stages))
}

/// Redeem an invite token for `user_id`.
pub async fn accept_invite(
    store: &dyn Store,
    token: &str,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<WorkspaceMember> {
    let mut invite = store
        .find_invite(token)
        .await?
        .ok_or_else(|| LeadflowError::InvalidInvite("não encontrado".into()))?;
    let member = invite.accept(user_id, now)?;
    store.update_invite(&invite).await?;
    store.insert_member(&member).await?;
    Ok(member)
}
