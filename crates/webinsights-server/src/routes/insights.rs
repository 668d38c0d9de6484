use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{error::AppError, state::AppState};

use super::RangeQuery;

/// `GET /api/insights`: insights and recommendations for a property and
/// date range, fetched from the configured source.
#[tracing::instrument(skip(state))]
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let property_id = state
        .property_id(query.property_id.as_deref())
        .ok_or(AppError::MissingParameter("property_id"))?;
    let request = state
        .metrics_request(
            property_id,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let result = state.run_analysis(&request).await?;
    Ok(Json(json!({
        "data": {
            "insights": result.insights,
            "recommendations": result.recommendations
        }
    })))
}
