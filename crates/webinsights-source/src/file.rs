//! Metrics bundle loaded from a JSON document on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use webinsights_core::bundle::RawMetricsBundle;
use webinsights_core::source::{MetricsRequest, DATE_FORMAT};
use webinsights_core::MetricsSource;

/// Reads the file on every fetch so edits are picked up without a restart.
///
/// Shape errors come back as [`webinsights_core::PipelineError`] inside the
/// `anyhow::Error`, so callers can tell them apart from I/O failures.
#[derive(Debug, Clone)]
pub struct FileMetricsSource {
    path: PathBuf,
}

impl FileMetricsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl MetricsSource for FileMetricsSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch(&self, request: &MetricsRequest) -> Result<RawMetricsBundle> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read metrics file {}", self.path.display()))?;
        let mut bundle = RawMetricsBundle::from_json_str(&raw)?;

        // The document may omit its own range; the request's range fills it in.
        if bundle.start_date.is_none() {
            bundle.start_date = Some(request.start_date.format(DATE_FORMAT).to_string());
        }
        if bundle.end_date.is_none() {
            bundle.end_date = Some(request.end_date.format(DATE_FORMAT).to_string());
        }
        if let Some(pages) = bundle.top_pages.as_mut() {
            pages.truncate(request.top_pages_limit);
        }

        debug!(
            path = %self.path.display(),
            property_id = %request.property_id,
            "Loaded metrics bundle from file"
        );
        Ok(bundle)
    }
}
