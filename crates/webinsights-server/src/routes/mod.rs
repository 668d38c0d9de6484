pub mod analyze;
pub mod health;
pub mod insights;
pub mod report;

use serde::Deserialize;

/// Query parameters of `GET /api/insights`.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub property_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
