use thiserror::Error;

use crate::pipeline::PipelineStage;

/// The only failure a pipeline run can surface to its caller.
///
/// Insufficient data (too few points for a trend, a zero mean, an all-zero
/// breakdown) is not an error: the affected output is simply absent or zero.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input format (pipeline halted at {stage}): {reason}")]
    InvalidInputFormat { stage: PipelineStage, reason: String },
}

impl PipelineError {
    pub fn invalid_input(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self::InvalidInputFormat {
            stage,
            reason: reason.into(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::InvalidInputFormat { stage, .. } => *stage,
        }
    }
}
