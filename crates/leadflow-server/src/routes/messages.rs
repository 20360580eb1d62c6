use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use leadflow_core::message::GeneratedMessage;
use serde::Deserialize;
use uuid::Uuid;

use super::actor;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SentBody {
    pub variant: Option<usize>,
}

/// POST /api/workspaces/:ws/leads/:id/messages/:message_id/sent: record
/// which variant was sent.
pub async fn mark_sent(
    State(app): State<AppState>,
    ApiPath((workspace_id, lead_id, message_id)): ApiPath<(Uuid, Uuid, Uuid)>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<SentBody>,
) -> Result<Json<GeneratedMessage>, AppError> {
    let Some(variant) = body.variant else {
        return Err(AppError::bad_request("variante é obrigatória"));
    };
    let message = app
        .leads
        .mark_message_sent(workspace_id, lead_id, message_id, variant, actor(&headers))
        .await?;
    Ok(Json(message))
}
