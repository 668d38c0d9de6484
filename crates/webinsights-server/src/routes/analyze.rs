use axum::{response::IntoResponse, Json};
use serde_json::{json, Value};

use webinsights_core::run_analysis;

use crate::error::AppError;

/// `POST /api/analyze`: run the pipeline over a raw bundle in the body.
///
/// A body that is not a bundle-shaped object is a `400 validation_error`.
#[tracing::instrument(skip(body))]
pub async fn analyze(Json(body): Json<Value>) -> Result<impl IntoResponse, AppError> {
    let result = run_analysis(body)?;
    Ok(Json(json!({ "data": result })))
}
