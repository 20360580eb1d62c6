//! The two generation functions. Their error contract differs from the REST
//! routes: missing identifiers are 400, every other failure is 500 with the
//! error text as `error`.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::SecondsFormat;
use leadflow_core::generation::TriggerReport;
use serde_json::Value;
use uuid::Uuid;

use crate::error::FunctionError;
use crate::state::AppState;

pub const GENERATE_IDS_REQUIRED: &str = "leadId e campaignId são obrigatórios";
pub const TRIGGER_IDS_REQUIRED: &str = "leadId e newStageId são obrigatórios";
pub const NO_MATCHING_CAMPAIGNS: &str = "Nenhuma campanha com gatilho nesta etapa";

fn parse_body(body: &Bytes) -> Result<Value, FunctionError> {
    serde_json::from_slice(body)
        .map_err(|e| FunctionError::bad_request(format!("corpo JSON inválido: {e}")))
}

/// A non-blank string under `key`.
fn id_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A present id that is not a UUID cannot match any row, so it maps to the
/// nil id and surfaces as the usual not-found error.
fn as_uuid(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or(Uuid::nil())
}

/// POST /functions/v1/generate-message
pub async fn generate_message(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, FunctionError> {
    let body = parse_body(&body)?;
    let (Some(lead_id), Some(campaign_id)) =
        (id_field(&body, "leadId"), id_field(&body, "campaignId"))
    else {
        return Err(FunctionError::bad_request(GENERATE_IDS_REQUIRED));
    };

    let outcome = app
        .generator
        .generate(as_uuid(lead_id), as_uuid(campaign_id), None)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "messages": outcome.messages,
        "generated_at": outcome.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}

/// POST /functions/v1/auto-generate
pub async fn auto_generate(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, FunctionError> {
    let body = parse_body(&body)?;
    let (Some(lead_id), Some(stage_id)) = (id_field(&body, "leadId"), id_field(&body, "newStageId"))
    else {
        return Err(FunctionError::bad_request(TRIGGER_IDS_REQUIRED));
    };

    let report = app
        .generator
        .auto_trigger(as_uuid(lead_id), as_uuid(stage_id))
        .await?;

    let json = match report {
        TriggerReport::NoMatchingCampaigns => serde_json::json!({
            "success": true,
            "message": NO_MATCHING_CAMPAIGNS,
        }),
        TriggerReport::Processed(results) => serde_json::json!({
            "success": true,
            "campaignsProcessed": results.len(),
            "results": results,
        }),
    };
    Ok(Json(json))
}
