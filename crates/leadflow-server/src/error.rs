use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leadflow_core::error::LeadflowError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 400 Bad Request errors
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain without
/// touching the `LeadflowError` enum.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: REST API errors
// ---------------------------------------------------------------------------

/// Unified error type for REST responses. Body is `{"error": "..."}`, plus
/// `missing_fields` when a stage's required fields block the request.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }
}

fn status_for(e: &LeadflowError) -> StatusCode {
    match e {
        LeadflowError::WorkspaceNotFound(_)
        | LeadflowError::LeadNotFound(_)
        | LeadflowError::CampaignNotFound(_)
        | LeadflowError::StageNotFound(_)
        | LeadflowError::MessageNotFound(_) => StatusCode::NOT_FOUND,
        LeadflowError::MissingRequiredFields { .. }
        | LeadflowError::InvalidLead(_)
        | LeadflowError::InvalidCampaign(_)
        | LeadflowError::InvalidWorkspace(_)
        | LeadflowError::UnknownField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LeadflowError::StageOutsideWorkspace { .. }
        | LeadflowError::InvalidVariant { .. }
        | LeadflowError::InvalidInvite(_)
        | LeadflowError::InvalidEnum { .. } => StatusCode::BAD_REQUEST,
        LeadflowError::EmptyGeneration
        | LeadflowError::InvalidConfig(_)
        | LeadflowError::StoreFault(_)
        | LeadflowError::Completion(_)
        | LeadflowError::Database(_)
        | LeadflowError::Migrate(_)
        | LeadflowError::Io(_)
        | LeadflowError::Yaml(_)
        | LeadflowError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let Some(e) = self.0.downcast_ref::<LeadflowError>() else {
            tracing::error!(error = %self.0, "unhandled error");
            let body = serde_json::json!({ "error": self.0.to_string() });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
        };

        let status = status_for(e);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %e, "request failed");
        }
        let body = match e {
            LeadflowError::MissingRequiredFields { stage, fields } => serde_json::json!({
                "error": e.to_string(),
                "stage": stage,
                "missing_fields": fields,
            }),
            _ => serde_json::json!({ "error": e.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ---------------------------------------------------------------------------
// FunctionError: the two generation endpoints
// ---------------------------------------------------------------------------

/// Error contract of the generation functions: missing identifiers and
/// malformed bodies are 400, everything else (including not-found) is 500
/// with the error text.
#[derive(Debug)]
pub struct FunctionError {
    pub status: StatusCode,
    pub message: String,
}

impl FunctionError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<LeadflowError> for FunctionError {
    fn from(e: LeadflowError) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.message, "function failed");
        }
        let body = serde_json::json!({ "error": self.message });
        (self.status, axum::Json(body)).into_response()
    }
}
