pub mod file;
pub mod sample;

use std::sync::Arc;

use webinsights_core::{config::SourceKind, MetricsSource};

pub use file::FileMetricsSource;
pub use sample::SampleMetricsSource;

/// The source selected by `WEBINSIGHTS_SOURCE`.
pub fn from_kind(kind: &SourceKind) -> Arc<dyn MetricsSource> {
    match kind {
        SourceKind::Sample => Arc::new(SampleMetricsSource),
        SourceKind::File(path) => Arc::new(FileMetricsSource::new(path)),
    }
}
