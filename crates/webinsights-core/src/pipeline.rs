//! Pipeline coordinator.
//!
//! Threads one run through `Extracted -> Processed -> Insighted -> Recommended
//! -> Visualized -> Done`. Each stage is a plain function of the previous
//! stages' outputs; the coordinator only sequences them and records where the
//! run is, so a failure can report the stage it halted at.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bundle::RawMetricsBundle;
use crate::error::PipelineError;
use crate::insight::{generate_insights, InsightBundle};
use crate::processing::{process, ProcessedMetrics};
use crate::recommendation::{recommend, RecommendationBundle};
use crate::visualization::{build_visualizations, VisualizationBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extracted,
    Processed,
    Insighted,
    Recommended,
    Visualized,
    Done,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Extracted,
        PipelineStage::Processed,
        PipelineStage::Insighted,
        PipelineStage::Recommended,
        PipelineStage::Visualized,
        PipelineStage::Done,
    ];

    /// The following state, or `None` once the run is done.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Extracted => Some(Self::Processed),
            Self::Processed => Some(Self::Insighted),
            Self::Insighted => Some(Self::Recommended),
            Self::Recommended => Some(Self::Visualized),
            Self::Visualized => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::Processed => "processed",
            Self::Insighted => "insighted",
            Self::Recommended => "recommended",
            Self::Visualized => "visualized",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run produced, in stage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub raw: RawMetricsBundle,
    pub processed: ProcessedMetrics,
    pub insights: InsightBundle,
    pub recommendations: RecommendationBundle,
    pub visualizations: VisualizationBundle,
    /// States the run passed through, `extracted` first and `done` last.
    pub stages: Vec<PipelineStage>,
}

/// Bookkeeping for a single run: its id and the state it has reached.
#[derive(Debug)]
pub struct Pipeline {
    run_id: Uuid,
    stage: PipelineStage,
    history: Vec<PipelineStage>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            stage: PipelineStage::Extracted,
            history: vec![PipelineStage::Extracted],
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// States visited so far, starting with `Extracted`.
    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            debug!(run_id = %self.run_id, from = %self.stage, to = %next, "Pipeline transition");
            self.stage = next;
            self.history.push(next);
        }
    }

    /// Validate an untyped bundle, then run it. A malformed bundle halts the
    /// run at `Extracted`.
    pub fn run_value(self, raw: Value) -> Result<AnalysisResult, PipelineError> {
        let raw = RawMetricsBundle::from_value(raw).inspect_err(|e| {
            debug!(run_id = %self.run_id, stage = %self.stage, error = %e, "Pipeline halted");
        })?;
        Ok(self.run(raw))
    }

    /// Run every stage over an already validated bundle.
    pub fn run(mut self, raw: RawMetricsBundle) -> AnalysisResult {
        let processed = process(&raw);
        self.advance();

        let insights = generate_insights(&processed);
        self.advance();

        let recommendations = recommend(&processed, &insights);
        self.advance();

        let visualizations = build_visualizations(&processed, &insights);
        self.advance();

        self.advance();
        info!(
            run_id = %self.run_id,
            anomalies = processed.anomalies.len(),
            charts = visualizations.charts().len(),
            "Analysis complete"
        );

        AnalysisResult {
            run_id: self.run_id,
            generated_at: Utc::now(),
            raw,
            processed,
            insights,
            recommendations,
            visualizations,
            stages: self.history,
        }
    }
}

/// Run the whole pipeline over an untyped raw bundle.
pub fn run_analysis(raw: Value) -> Result<AnalysisResult, PipelineError> {
    Pipeline::new().run_value(raw)
}

/// Run the whole pipeline over a typed raw bundle, e.g. one a metrics source
/// returned.
pub fn analyze(raw: RawMetricsBundle) -> AnalysisResult {
    Pipeline::new().run(raw)
}
