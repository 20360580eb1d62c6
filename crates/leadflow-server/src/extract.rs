//! JSON body and path extractors whose rejections use the API error shape.
//!
//! axum's own `Json` and `Path` reject with a plain-text body (and 422 for
//! body type mismatches). These wrappers turn every rejection into a 400
//! with `{"error": "..."}` like the rest of the REST surface.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `axum::Json` with a `{error}` 400 rejection.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// `axum::extract::Path` with a `{error}` 400 rejection.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let detail = rejection.body_text();
    tracing::debug!(error = %detail, "rejected request body");
    AppError::bad_request(format!("corpo da requisição inválido: {detail}"))
}

fn path_rejection(rejection: PathRejection) -> AppError {
    let detail = rejection.body_text();
    tracing::debug!(error = %detail, "rejected request path");
    AppError::bad_request(format!("caminho inválido: {detail}"))
}
