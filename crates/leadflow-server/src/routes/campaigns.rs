use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use leadflow_core::campaign::{Campaign, CampaignPatch, NewCampaign};
use leadflow_core::LeadflowError;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

async fn workspace_campaign(
    app: &AppState,
    workspace_id: Uuid,
    campaign_id: Uuid,
) -> Result<Campaign, LeadflowError> {
    app.store
        .get_campaign(campaign_id)
        .await?
        .filter(|c| c.workspace_id == workspace_id)
        .ok_or_else(|| LeadflowError::CampaignNotFound(campaign_id.to_string()))
}

/// GET /api/workspaces/:ws/campaigns
pub async fn list_campaigns(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    app.leads.ensure_workspace(workspace_id).await?;
    Ok(Json(app.store.list_campaigns(workspace_id).await?))
}

/// POST /api/workspaces/:ws/campaigns
pub async fn create_campaign(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>), AppError> {
    body.validate()?;
    app.leads.ensure_workspace(workspace_id).await?;
    if let Some(stage_id) = body.trigger_stage_id {
        app.leads.workspace_stage(workspace_id, stage_id).await?;
    }

    let campaign = body.into_campaign(workspace_id);
    app.store.insert_campaign(&campaign).await?;
    tracing::info!(campaign_id = %campaign.id, name = %campaign.name, "campaign created");
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /api/workspaces/:ws/campaigns/:id
pub async fn get_campaign(
    State(app): State<AppState>,
    ApiPath((workspace_id, campaign_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Campaign>, AppError> {
    Ok(Json(workspace_campaign(&app, workspace_id, campaign_id).await?))
}

/// PUT /api/workspaces/:ws/campaigns/:id: partial update; an explicit
/// `"trigger_stage_id": null` clears the trigger.
pub async fn update_campaign(
    State(app): State<AppState>,
    ApiPath((workspace_id, campaign_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<CampaignPatch>,
) -> Result<Json<Campaign>, AppError> {
    body.validate()?;
    let mut campaign = workspace_campaign(&app, workspace_id, campaign_id).await?;
    if let Some(Some(stage_id)) = body.trigger_stage_id {
        app.leads.workspace_stage(workspace_id, stage_id).await?;
    }

    campaign.apply(body);
    app.store.update_campaign(&campaign).await?;
    Ok(Json(campaign))
}
