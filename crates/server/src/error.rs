//! HTTP-surface error type.
//!
//! [`AppError`] is what handlers return. Its `IntoResponse` impl maps
//! each failure to a status code and a small JSON body, logging
//! server-side causes before they leave the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the HTTP API.
#[derive(Error, Debug)]
pub enum AppError {
    /// Persistence failure below the API
    #[error("Job store error: {0}")]
    Store(StoreError),

    /// Unknown resource
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Request payload failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Concurrent modification detected
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Job store error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("job {} does not exist", id)),
            StoreError::Conflict(id) => {
                AppError::Conflict(format!("job {} was updated concurrently", id))
            }
            other => AppError::Store(other),
        }
    }
}
