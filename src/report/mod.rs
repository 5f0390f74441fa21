//! Report module - summarizing pipeline runs

pub mod run_report;
pub mod summary;

pub use run_report::{RunMetadata, RunReport};
pub use summary::PipelineSummary;
