use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    report::{render, ReportFormat},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub property_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub format: ReportFormat,
}

/// `GET /api/report`: the full report for a property and date range, as
/// HTML (default) or JSON.
#[tracing::instrument(skip(state))]
pub async fn report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
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
    let body = render(&result, query.format)?;
    Ok(([(header::CONTENT_TYPE, query.format.content_type())], body))
}
