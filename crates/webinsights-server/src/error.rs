use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use webinsights_core::PipelineError;

/// Application-level errors that map directly to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    InvalidInput(#[from] PipelineError),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    /// A bundle that failed validation inside a source is the caller's
    /// problem, everything else is ours.
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<PipelineError>() {
            Ok(pipeline) => Self::InvalidInput(pipeline),
            Err(other) => Self::Internal(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
                None,
            ),
            AppError::MissingParameter(field) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("{field} is required"),
                Some(*field),
            ),
            AppError::InvalidInput(e) => {
                tracing::warn!(stage = %e.stage(), "Rejected metrics bundle: {e}");
                (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": field
                }
            })),
        )
            .into_response()
    }
}
