/// Re-export `Config` from `webinsights-core` for use within this crate.
///
/// Environment parsing lives in the core crate so the CLI, the server and the
/// integration tests share one definition.
pub use webinsights_core::config::{Config, SourceKind};
