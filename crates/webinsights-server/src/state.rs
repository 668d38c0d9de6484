use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use webinsights_core::{
    analyze, config::Config, AnalysisResult, MetricsRequest, MetricsSource, PipelineError,
};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`]. Also drives the `analyze` CLI command.
pub struct AppState {
    /// Where raw bundles come from. Chosen once at startup from
    /// `WEBINSIGHTS_SOURCE`.
    pub source: Arc<dyn MetricsSource>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(source: Arc<dyn MetricsSource>, config: Config) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }

    /// Property id from the caller, falling back to `WEBINSIGHTS_PROPERTY_ID`.
    pub fn property_id(&self, requested: Option<&str>) -> Option<String> {
        requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.property_id.clone())
    }

    /// Build a request for the configured lookback and page limit.
    pub fn metrics_request(
        &self,
        property_id: String,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<MetricsRequest> {
        MetricsRequest::parse(
            property_id,
            start_date,
            end_date,
            chrono::Utc::now().date_naive(),
            self.config.default_range_days,
            self.config.top_pages_limit,
        )
    }

    /// Fetch a bundle from the source and run the pipeline over it.
    pub async fn run_analysis(&self, request: &MetricsRequest) -> Result<AnalysisResult> {
        let raw = self
            .source
            .fetch(request)
            .await
            .map_err(|e| match e.downcast::<PipelineError>() {
                Ok(pipeline) => anyhow::Error::from(pipeline),
                Err(other) => other.context(format!("{} source failed", self.source.name())),
            })?;
        let result = analyze(raw);
        info!(
            run_id = %result.run_id,
            source = self.source.name(),
            property_id = %request.property_id,
            "Analysis served"
        );
        Ok(result)
    }
}
