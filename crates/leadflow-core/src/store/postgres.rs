use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::Store;
use crate::activity::ActivityLog;
use crate::campaign::Campaign;
use crate::error::{LeadflowError, Result};
use crate::lead::Lead;
use crate::message::GeneratedMessage;
use crate::stage::{CustomField, FunnelStage};
use crate::workspace::{Workspace, WorkspaceInvite, WorkspaceMember};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Postgres-backed store. JSON-shaped columns (`custom_data`,
/// `required_fields`, `messages`, `details`, `options`) are JSONB.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(FromRow)]
struct WorkspaceRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(r: WorkspaceRow) -> Self {
        Workspace {
            id: r.id,
            name: r.name,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct MemberRow {
    workspace_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for WorkspaceMember {
    type Error = LeadflowError;

    fn try_from(r: MemberRow) -> Result<Self> {
        Ok(WorkspaceMember {
            workspace_id: r.workspace_id,
            user_id: r.user_id,
            role: r.role.parse()?,
            joined_at: r.joined_at,
        })
    }
}

#[derive(FromRow)]
struct InviteRow {
    id: Uuid,
    workspace_id: Uuid,
    email: String,
    role: String,
    token: String,
    invited_by: Option<Uuid>,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InviteRow> for WorkspaceInvite {
    type Error = LeadflowError;

    fn try_from(r: InviteRow) -> Result<Self> {
        Ok(WorkspaceInvite {
            id: r.id,
            workspace_id: r.workspace_id,
            email: r.email,
            role: r.role.parse()?,
            token: r.token,
            invited_by: r.invited_by,
            expires_at: r.expires_at,
            accepted_at: r.accepted_at,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct StageRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    order: i32,
    required_fields: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl From<StageRow> for FunnelStage {
    fn from(r: StageRow) -> Self {
        FunnelStage {
            id: r.id,
            workspace_id: r.workspace_id,
            name: r.name,
            order: r.order,
            required_fields: r.required_fields.0,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct CustomFieldRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    field_type: String,
    options: Option<Json<Vec<String>>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomFieldRow> for CustomField {
    type Error = LeadflowError;

    fn try_from(r: CustomFieldRow) -> Result<Self> {
        Ok(CustomField {
            id: r.id,
            workspace_id: r.workspace_id,
            name: r.name,
            field_type: r.field_type.parse()?,
            options: r.options.map(|o| o.0),
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct LeadRow {
    id: Uuid,
    workspace_id: Uuid,
    stage_id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    position: Option<String>,
    source: Option<String>,
    notes: Option<String>,
    assigned_to: Option<Uuid>,
    custom_data: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeadRow> for Lead {
    fn from(r: LeadRow) -> Self {
        Lead {
            id: r.id,
            workspace_id: r.workspace_id,
            stage_id: r.stage_id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            company: r.company,
            position: r.position,
            source: r.source,
            notes: r.notes,
            assigned_to: r.assigned_to,
            custom_data: r.custom_data.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CampaignRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    context: String,
    prompt: String,
    trigger_stage_id: Option<Uuid>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CampaignRow> for Campaign {
    fn from(r: CampaignRow) -> Self {
        Campaign {
            id: r.id,
            workspace_id: r.workspace_id,
            name: r.name,
            context: r.context,
            prompt: r.prompt,
            trigger_stage_id: r.trigger_stage_id,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    lead_id: Uuid,
    campaign_id: Uuid,
    messages: Json<Vec<String>>,
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for GeneratedMessage {
    fn from(r: MessageRow) -> Self {
        GeneratedMessage {
            id: r.id,
            lead_id: r.lead_id,
            campaign_id: r.campaign_id,
            messages: r.messages.0,
            sent_at: r.sent_at,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: Uuid,
    lead_id: Uuid,
    user_id: Option<Uuid>,
    action_type: String,
    details: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = LeadflowError;

    fn try_from(r: ActivityRow) -> Result<Self> {
        Ok(ActivityLog {
            id: r.id,
            lead_id: r.lead_id,
            user_id: r.user_id,
            action_type: r.action_type.parse()?,
            details: r.details.0,
            created_at: r.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = LeadflowError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const STAGE_COLUMNS: &str = r#"id, workspace_id, name, "order", required_fields, created_at"#;
const LEAD_COLUMNS: &str = "id, workspace_id, stage_id, name, email, phone, company, position, \
     source, notes, assigned_to, custom_data, created_at, updated_at";
const CAMPAIGN_COLUMNS: &str =
    "id, workspace_id, name, context, prompt, trigger_stage_id, is_active, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, lead_id, campaign_id, messages, sent_at, created_at";

// ---------------------------------------------------------------------------
// Store impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Store for PgStore {
    async fn insert_workspace(&self, workspace: &Workspace) -> Result<()> {
        sqlx::query("INSERT INTO workspaces (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(workspace.id)
            .bind(&workspace.name)
            .bind(workspace.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        let row = sqlx::query_as::<_, WorkspaceRow>(
            "SELECT id, name, created_at FROM workspaces WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Workspace::from))
    }

    async fn insert_member(&self, member: &WorkspaceMember) -> Result<()> {
        sqlx::query(
            "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (workspace_id, user_id) DO UPDATE SET role = excluded.role",
        )
        .bind(member.workspace_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_members(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT workspace_id, user_id, role, joined_at FROM workspace_members \
             WHERE workspace_id = $1 ORDER BY joined_at",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn insert_invite(&self, invite: &WorkspaceInvite) -> Result<()> {
        sqlx::query(
            "INSERT INTO workspace_invites \
             (id, workspace_id, email, role, token, invited_by, expires_at, accepted_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(invite.id)
        .bind(invite.workspace_id)
        .bind(&invite.email)
        .bind(invite.role.as_str())
        .bind(&invite.token)
        .bind(invite.invited_by)
        .bind(invite.expires_at)
        .bind(invite.accepted_at)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_invite(&self, token: &str) -> Result<Option<WorkspaceInvite>> {
        let row = sqlx::query_as::<_, InviteRow>(
            "SELECT id, workspace_id, email, role, token, invited_by, expires_at, accepted_at, \
             created_at FROM workspace_invites WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(WorkspaceInvite::try_from).transpose()
    }

    async fn update_invite(&self, invite: &WorkspaceInvite) -> Result<()> {
        sqlx::query("UPDATE workspace_invites SET accepted_at = $2, expires_at = $3 WHERE id = $1")
            .bind(invite.id)
            .bind(invite.accepted_at)
            .bind(invite.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_stage(&self, stage: &FunnelStage) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO funnel_stages (id, workspace_id, name, "order", required_fields, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(stage.id)
        .bind(stage.workspace_id)
        .bind(&stage.name)
        .bind(stage.order)
        .bind(Json(&stage.required_fields))
        .bind(stage.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_stage(&self, id: Uuid) -> Result<Option<FunnelStage>> {
        let sql = format!("SELECT {STAGE_COLUMNS} FROM funnel_stages WHERE id = $1");
        let row = sqlx::query_as::<_, StageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(FunnelStage::from))
    }

    async fn list_stages(&self, workspace_id: Uuid) -> Result<Vec<FunnelStage>> {
        let sql = format!(
            r#"SELECT {STAGE_COLUMNS} FROM funnel_stages WHERE workspace_id = $1 ORDER BY "order", created_at"#
        );
        let rows = sqlx::query_as::<_, StageRow>(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(FunnelStage::from).collect())
    }

    async fn set_required_fields(
        &self,
        stage_id: Uuid,
        fields: &[String],
    ) -> Result<Option<FunnelStage>> {
        let sql = format!(
            "UPDATE funnel_stages SET required_fields = $2 WHERE id = $1 RETURNING {STAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StageRow>(&sql)
            .bind(stage_id)
            .bind(Json(fields))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(FunnelStage::from))
    }

    async fn insert_custom_field(&self, field: &CustomField) -> Result<()> {
        sqlx::query(
            "INSERT INTO custom_fields (id, workspace_id, name, field_type, options, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(field.id)
        .bind(field.workspace_id)
        .bind(&field.name)
        .bind(field.field_type.as_str())
        .bind(field.options.as_ref().map(Json))
        .bind(field.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_custom_fields(&self, workspace_id: Uuid) -> Result<Vec<CustomField>> {
        let rows = sqlx::query_as::<_, CustomFieldRow>(
            "SELECT id, workspace_id, name, field_type, options, created_at FROM custom_fields \
             WHERE workspace_id = $1 ORDER BY created_at",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn insert_lead(&self, lead: &Lead) -> Result<()> {
        let sql = format!(
            "INSERT INTO leads ({LEAD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        );
        sqlx::query(&sql)
            .bind(lead.id)
            .bind(lead.workspace_id)
            .bind(lead.stage_id)
            .bind(&lead.name)
            .bind(&lead.email)
            .bind(&lead.phone)
            .bind(&lead.company)
            .bind(&lead.position)
            .bind(&lead.source)
            .bind(&lead.notes)
            .bind(lead.assigned_to)
            .bind(Json(&lead.custom_data))
            .bind(lead.created_at)
            .bind(lead.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1");
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Lead::from))
    }

    async fn update_lead(&self, lead: &Lead) -> Result<()> {
        let result = sqlx::query(
            "UPDATE leads SET stage_id = $2, name = $3, email = $4, phone = $5, company = $6, \
             position = $7, source = $8, notes = $9, assigned_to = $10, custom_data = $11, \
             updated_at = $12 WHERE id = $1",
        )
        .bind(lead.id)
        .bind(lead.stage_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.position)
        .bind(&lead.source)
        .bind(&lead.notes)
        .bind(lead.assigned_to)
        .bind(Json(&lead.custom_data))
        .bind(lead.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(LeadflowError::StoreFault("lead inexistente".into()));
        }
        Ok(())
    }

    async fn list_leads(&self, workspace_id: Uuid) -> Result<Vec<Lead>> {
        let sql =
            format!("SELECT {LEAD_COLUMNS} FROM leads WHERE workspace_id = $1 ORDER BY created_at");
        let rows = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<()> {
        let sql = format!(
            "INSERT INTO campaigns ({CAMPAIGN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&sql)
            .bind(campaign.id)
            .bind(campaign.workspace_id)
            .bind(&campaign.name)
            .bind(&campaign.context)
            .bind(&campaign.prompt)
            .bind(campaign.trigger_stage_id)
            .bind(campaign.is_active)
            .bind(campaign.created_at)
            .bind(campaign.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1");
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Campaign::from))
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<()> {
        let result = sqlx::query(
            "UPDATE campaigns SET name = $2, context = $3, prompt = $4, trigger_stage_id = $5, \
             is_active = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(campaign.id)
        .bind(&campaign.name)
        .bind(&campaign.context)
        .bind(&campaign.prompt)
        .bind(campaign.trigger_stage_id)
        .bind(campaign.is_active)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(LeadflowError::StoreFault("campanha inexistente".into()));
        }
        Ok(())
    }

    async fn list_campaigns(&self, workspace_id: Uuid) -> Result<Vec<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE workspace_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Campaign::from).collect())
    }

    async fn list_triggered_campaigns(
        &self,
        workspace_id: Uuid,
        stage_id: Uuid,
    ) -> Result<Vec<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
             WHERE workspace_id = $1 AND is_active AND trigger_stage_id = $2 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(workspace_id)
            .bind(stage_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Campaign::from).collect())
    }

    async fn insert_generated_message(&self, message: &GeneratedMessage) -> Result<()> {
        let sql =
            format!("INSERT INTO generated_messages ({MESSAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)");
        sqlx::query(&sql)
            .bind(message.id)
            .bind(message.lead_id)
            .bind(message.campaign_id)
            .bind(Json(&message.messages))
            .bind(message.sent_at)
            .bind(message.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_generated_message(&self, id: Uuid) -> Result<Option<GeneratedMessage>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM generated_messages WHERE id = $1");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(GeneratedMessage::from))
    }

    async fn mark_message_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<GeneratedMessage>> {
        let sql = format!(
            "UPDATE generated_messages SET sent_at = $2 WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(id)
            .bind(sent_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(GeneratedMessage::from))
    }

    async fn list_generated_messages(&self, lead_id: Uuid) -> Result<Vec<GeneratedMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM generated_messages WHERE lead_id = $1 \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(lead_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GeneratedMessage::from).collect())
    }

    async fn insert_activity(&self, entry: &ActivityLog) -> Result<()> {
        sqlx::query(
            "INSERT INTO activity_logs (id, lead_id, user_id, action_type, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.lead_id)
        .bind(entry.user_id)
        .bind(entry.action_type.as_str())
        .bind(Json(&entry.details))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_activity(&self, lead_id: Uuid) -> Result<Vec<ActivityLog>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT id, lead_id, user_id, action_type, details, created_at FROM activity_logs \
             WHERE lead_id = $1 ORDER BY created_at",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }
}

/// Run against a scratch database:
/// `DATABASE_URL=postgres://... cargo test -p leadflow-core -- --ignored`.
/// Every test works inside its own fresh workspace, so runs can share a
/// database.
#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::types::ActionType;

    async fn store() -> Option<PgStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return None;
        };
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        let store = PgStore::from_pool(pool);
        store.migrate().await.unwrap();
        Some(store)
    }

    struct Seeded {
        workspace: Workspace,
        novo: FunnelStage,
        proposta: FunnelStage,
    }

    async fn seed(store: &PgStore) -> Seeded {
        let workspace = Workspace::new("Acme Vendas");
        store.insert_workspace(&workspace).await.unwrap();
        let novo = FunnelStage::new(workspace.id, "Novo", 1);
        let proposta = FunnelStage::new(workspace.id, "Proposta", 2).with_required(&["email"]);
        store.insert_stage(&proposta).await.unwrap();
        store.insert_stage(&novo).await.unwrap();
        Seeded {
            workspace,
            novo,
            proposta,
        }
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn lead_custom_data_survives_insert_and_update() {
        let Some(store) = store().await else { return };
        let s = seed(&store).await;

        let mut lead = Lead::new(s.workspace.id, s.novo.id, "Ana Lima");
        lead.email = Some("ana@acme.com".into());
        lead.custom_data.insert("Setor".into(), json!("Varejo"));
        lead.custom_data.insert("Orçamento".into(), json!(5000));
        store.insert_lead(&lead).await.unwrap();

        let stored = store.get_lead(lead.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ana Lima");
        assert_eq!(stored.email.as_deref(), Some("ana@acme.com"));
        assert_eq!(stored.phone, None);
        assert_eq!(stored.custom_data["Setor"], json!("Varejo"));
        assert_eq!(stored.custom_data["Orçamento"], json!(5000));

        lead.stage_id = s.proposta.id;
        lead.custom_data.insert("Setor".into(), json!("Indústria"));
        store.update_lead(&lead).await.unwrap();
        let stored = store.get_lead(lead.id).await.unwrap().unwrap();
        assert_eq!(stored.stage_id, s.proposta.id);
        assert_eq!(stored.custom_data["Setor"], json!("Indústria"));

        let listed = store.list_leads(s.workspace.id).await.unwrap();
        assert_eq!(listed.len(), 1);

        let ghost = Lead::new(s.workspace.id, s.novo.id, "Ninguém");
        let err = store.update_lead(&ghost).await.unwrap_err();
        assert!(matches!(err, LeadflowError::StoreFault(_)));
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn stages_list_in_order_and_required_fields_are_replaced() {
        let Some(store) = store().await else { return };
        let s = seed(&store).await;

        let stages = store.list_stages(s.workspace.id).await.unwrap();
        let names: Vec<_> = stages.iter().map(|st| st.name.as_str()).collect();
        assert_eq!(names, ["Novo", "Proposta"]);
        assert_eq!(stages[1].required_fields, vec!["email"]);

        let fields = vec!["phone".to_string(), "Orçamento".to_string()];
        let updated = store
            .set_required_fields(s.novo.id, &fields)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.required_fields, fields);
        let stored = store.get_stage(s.novo.id).await.unwrap().unwrap();
        assert_eq!(stored.required_fields, fields);

        let missing = store
            .set_required_fields(Uuid::new_v4(), &fields)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn custom_field_options_are_optional_json() {
        let Some(store) = store().await else { return };
        let s = seed(&store).await;

        let setor = CustomField::select(
            s.workspace.id,
            "Setor",
            vec!["Varejo".into(), "Indústria".into()],
        );
        let mut budget = CustomField::new(
            s.workspace.id,
            "Orçamento",
            crate::types::CustomFieldType::Number,
        );
        budget.created_at = setor.created_at + Duration::seconds(1);
        store.insert_custom_field(&setor).await.unwrap();
        store.insert_custom_field(&budget).await.unwrap();

        let fields = store.list_custom_fields(s.workspace.id).await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(
            fields[0].options.as_deref(),
            Some(&["Varejo".to_string(), "Indústria".to_string()][..])
        );
        assert_eq!(fields[1].options, None);
        assert_eq!(fields[1].field_type, crate::types::CustomFieldType::Number);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn triggered_campaigns_are_active_for_the_stage_oldest_first() {
        let Some(store) = store().await else { return };
        let s = seed(&store).await;
        let ws = s.workspace.id;
        let now = Utc::now();

        let mut first = Campaign::new(ws, "Primeira", "ctx", "p").triggered_by(s.proposta.id);
        first.created_at = now - Duration::seconds(20);
        let mut second = Campaign::new(ws, "Segunda", "ctx", "p").triggered_by(s.proposta.id);
        second.created_at = now - Duration::seconds(10);
        let paused = Campaign::new(ws, "Pausada", "ctx", "p")
            .triggered_by(s.proposta.id)
            .inactive();
        let elsewhere = Campaign::new(ws, "Outra etapa", "ctx", "p").triggered_by(s.novo.id);
        let manual = Campaign::new(ws, "Manual", "ctx", "p");
        for c in [&second, &paused, &elsewhere, &manual, &first] {
            store.insert_campaign(c).await.unwrap();
        }

        let triggered = store
            .list_triggered_campaigns(ws, s.proposta.id)
            .await
            .unwrap();
        let ids: Vec<_> = triggered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let other_ws = store
            .list_triggered_campaigns(Uuid::new_v4(), s.proposta.id)
            .await
            .unwrap();
        assert!(other_ws.is_empty());

        let stored = store.get_campaign(manual.id).await.unwrap().unwrap();
        assert_eq!(stored.trigger_stage_id, None);

        let mut cleared = first.clone();
        cleared.trigger_stage_id = None;
        store.update_campaign(&cleared).await.unwrap();
        let stored = store.get_campaign(first.id).await.unwrap().unwrap();
        assert_eq!(stored.trigger_stage_id, None);
        let triggered = store
            .list_triggered_campaigns(ws, s.proposta.id)
            .await
            .unwrap();
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].id, second.id);

        assert_eq!(store.list_campaigns(ws).await.unwrap().len(), 5);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn generated_messages_round_trip_and_mark_sent() {
        let Some(store) = store().await else { return };
        let s = seed(&store).await;
        let lead = Lead::new(s.workspace.id, s.novo.id, "Ana");
        store.insert_lead(&lead).await.unwrap();
        let campaign = Campaign::new(s.workspace.id, "Boas-vindas", "ctx", "p");
        store.insert_campaign(&campaign).await.unwrap();

        let mut older = GeneratedMessage::new(lead.id, campaign.id, vec!["Oi".into()]);
        older.created_at = Utc::now() - Duration::seconds(30);
        let newer = GeneratedMessage::new(
            lead.id,
            campaign.id,
            vec!["Oi Ana!".into(), "Tudo bem?".into(), "Olá.".into()],
        );
        store.insert_generated_message(&older).await.unwrap();
        store.insert_generated_message(&newer).await.unwrap();

        let listed = store.list_generated_messages(lead.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[0].messages, newer.messages);
        assert!(listed.iter().all(|m| m.sent_at.is_none()));

        let sent_at = Utc::now();
        let sent = store
            .mark_message_sent(newer.id, sent_at)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            sent.sent_at.map(|t| t.timestamp_micros()),
            Some(sent_at.timestamp_micros())
        );
        let stored = store.get_generated_message(newer.id).await.unwrap().unwrap();
        assert!(stored.is_sent());
        let untouched = store.get_generated_message(older.id).await.unwrap().unwrap();
        assert!(!untouched.is_sent());

        let missing = store.mark_message_sent(Uuid::new_v4(), sent_at).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn activity_details_round_trip() {
        let Some(store) = store().await else { return };
        let s = seed(&store).await;
        let lead = Lead::new(s.workspace.id, s.novo.id, "Ana");
        store.insert_lead(&lead).await.unwrap();

        let actor = Uuid::new_v4();
        let mut created = ActivityLog::new(lead.id, Some(actor), ActionType::LeadCreated)
            .detail("stage_name", "Novo");
        created.created_at = Utc::now() - Duration::seconds(5);
        let moved = ActivityLog::new(lead.id, None, ActionType::StageChanged)
            .detail("from_stage", "Novo")
            .detail("to_stage", "Proposta");
        store.insert_activity(&moved).await.unwrap();
        store.insert_activity(&created).await.unwrap();

        let log = store.list_activity(lead.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action_type, ActionType::LeadCreated);
        assert_eq!(log[0].user_id, Some(actor));
        assert_eq!(log[0].details["stage_name"], json!("Novo"));
        assert_eq!(log[1].action_type, ActionType::StageChanged);
        assert_eq!(log[1].user_id, None);
        assert_eq!(log[1].details["to_stage"], json!("Proposta"));
    }
}
