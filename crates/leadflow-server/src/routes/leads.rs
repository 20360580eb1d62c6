use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use leadflow_core::activity::ActivityLog;
use leadflow_core::lead::{Lead, LeadPatch, NewLead};
use leadflow_core::leads::MoveOutcome;
use leadflow_core::message::GeneratedMessage;
use serde::Deserialize;
use uuid::Uuid;

use super::actor;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/workspaces/:ws/leads: all leads, oldest first.
pub async fn list_leads(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Lead>>, AppError> {
    app.leads.ensure_workspace(workspace_id).await?;
    Ok(Json(app.store.list_leads(workspace_id).await?))
}

/// POST /api/workspaces/:ws/leads
pub async fn create_lead(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<NewLead>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let lead = app
        .leads
        .create_lead(workspace_id, body, actor(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/workspaces/:ws/leads/:id
pub async fn get_lead(
    State(app): State<AppState>,
    ApiPath((workspace_id, lead_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Lead>, AppError> {
    Ok(Json(app.leads.workspace_lead(workspace_id, lead_id).await?))
}

/// PATCH /api/workspaces/:ws/leads/:id
pub async fn update_lead(
    State(app): State<AppState>,
    ApiPath((workspace_id, lead_id)): ApiPath<(Uuid, Uuid)>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<LeadPatch>,
) -> Result<Json<Lead>, AppError> {
    let lead = app
        .leads
        .update_lead(workspace_id, lead_id, body, actor(&headers))
        .await?;
    Ok(Json(lead))
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub stage_id: Uuid,
}

/// POST /api/workspaces/:ws/leads/:id/move: 422 with `missing_fields` when
/// the destination's required fields are not all filled.
pub async fn move_lead(
    State(app): State<AppState>,
    ApiPath((workspace_id, lead_id)): ApiPath<(Uuid, Uuid)>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<MoveBody>,
) -> Result<Json<MoveOutcome>, AppError> {
    let outcome = app
        .leads
        .move_lead(workspace_id, lead_id, body.stage_id, actor(&headers))
        .await?;
    Ok(Json(outcome))
}

/// GET /api/workspaces/:ws/leads/:id/activity
pub async fn list_activity(
    State(app): State<AppState>,
    ApiPath((workspace_id, lead_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Vec<ActivityLog>>, AppError> {
    let lead = app.leads.workspace_lead(workspace_id, lead_id).await?;
    Ok(Json(app.store.list_activity(lead.id).await?))
}

/// GET /api/workspaces/:ws/leads/:id/messages: newest first.
pub async fn list_messages(
    State(app): State<AppState>,
    ApiPath((workspace_id, lead_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Vec<GeneratedMessage>>, AppError> {
    let lead = app.leads.workspace_lead(workspace_id, lead_id).await?;
    Ok(Json(app.store.list_generated_messages(lead.id).await?))
}
