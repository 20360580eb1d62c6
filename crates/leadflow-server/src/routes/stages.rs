use axum::extract::State;
use axum::Json;
use leadflow_core::stage::{normalize_required_fields, CustomField, FunnelStage};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/workspaces/:ws/board: stages in order, each with its leads.
pub async fn get_board(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let columns = app.leads.board(workspace_id).await?;
    Ok(Json(serde_json::json!(columns)))
}

/// GET /api/workspaces/:ws/stages
pub async fn list_stages(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
) -> Result<Json<Vec<FunnelStage>>, AppError> {
    app.leads.ensure_workspace(workspace_id).await?;
    Ok(Json(app.store.list_stages(workspace_id).await?))
}

/// GET /api/workspaces/:ws/custom-fields
pub async fn list_custom_fields(
    State(app): State<AppState>,
    ApiPath(workspace_id): ApiPath<Uuid>,
) -> Result<Json<Vec<CustomField>>, AppError> {
    app.leads.ensure_workspace(workspace_id).await?;
    Ok(Json(app.store.list_custom_fields(workspace_id).await?))
}

#[derive(Deserialize)]
pub struct RequiredFieldsBody {
    pub required_fields: Vec<String>,
}

/// PUT /api/workspaces/:ws/stages/:id/required-fields: replace the list of
/// fields a lead must have filled to enter the stage.
pub async fn put_required_fields(
    State(app): State<AppState>,
    ApiPath((workspace_id, stage_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<RequiredFieldsBody>,
) -> Result<Json<FunnelStage>, AppError> {
    let stage = app.leads.workspace_stage(workspace_id, stage_id).await?;
    let custom_fields = app.store.list_custom_fields(workspace_id).await?;
    let fields = normalize_required_fields(&body.required_fields, &custom_fields)?;

    let updated = app
        .store
        .set_required_fields(stage.id, &fields)
        .await?
        .ok_or_else(|| leadflow_core::LeadflowError::StageNotFound(stage_id.to_string()))?;
    tracing::info!(stage = %updated.name, fields = ?updated.required_fields, "required fields updated");
    Ok(Json(updated))
}
