pub mod bundle;
pub mod config;
pub mod error;
pub mod insight;
pub mod pipeline;
pub mod processing;
pub mod recommendation;
pub mod source;
pub mod visualization;

pub use bundle::RawMetricsBundle;
pub use error::PipelineError;
pub use pipeline::{analyze, run_analysis, AnalysisResult, PipelineStage};
pub use source::{MetricsRequest, MetricsSource};
