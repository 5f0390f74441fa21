//! JSON record of one pipeline run

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact, PipelineOutcome,
    PipelineSettings, Result, RunContext, TransformationStats,
};
use crate::utils::persist::save_object;

/// Metadata about the run
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    /// Name of the run directory
    pub run: String,
    /// Time the report was written (RFC 3339)
    pub written_at: String,
    pub visaprep_version: String,
    pub artifact_dir: String,
    /// Year derived age columns were measured from
    pub reference_year: i32,
}

/// Everything written to `run_report.json`
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    pub settings: &'a PipelineSettings,
    pub ingestion: &'a DataIngestionArtifact,
    pub validation: &'a DataValidationArtifact,
    pub transformation: &'a DataTransformationArtifact,
    pub stats: &'a TransformationStats,
}

impl<'a> RunReport<'a> {
    pub fn new(
        ctx: &RunContext,
        settings: &'a PipelineSettings,
        outcome: &'a PipelineOutcome,
    ) -> Self {
        Self {
            metadata: RunMetadata {
                run: ctx.timestamp.clone(),
                written_at: Utc::now().to_rfc3339(),
                visaprep_version: env!("CARGO_PKG_VERSION").to_string(),
                artifact_dir: ctx.artifact_dir.display().to_string(),
                reference_year: ctx.reference_year,
            },
            settings,
            ingestion: &outcome.ingestion,
            validation: &outcome.validation,
            transformation: &outcome.transformation,
            stats: &outcome.stats,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_object(path, self)?;
        tracing::info!(path = %path.display(), "wrote run report");
        Ok(())
    }
}
