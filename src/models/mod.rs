//! Data models and structures for the diagnostic engine

pub mod config;
pub mod snapshot;

// Re-export main model types
pub use config::Config;
pub use snapshot::{DiagnosticSnapshot, ProbeOutcome, ProbeStatus, TargetResult, FALLBACK_EXHAUSTED_REASON};
