//! Training pipeline orchestrator
//!
//! Sequences ingestion, validation and transformation for one run. Every stage
//! config is derived from the same [`RunContext`], and a stage failure is
//! wrapped once with the stage that raised it.

use std::path::PathBuf;

use serde::Serialize;

use super::artifact::{DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact};
use super::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, RunContext,
    SplitStrategy, COLLECTION_NAME, DATABASE_NAME, DATA_INGESTION_SPLIT_SEED,
    DATA_INGESTION_TEST_SIZE, SCHEMA_FILE_PATH,
};
use super::error::{Result, Stage};
use super::ingestion::DataIngestion;
use super::resample::SmoteEnn;
use super::schema::Schema;
use super::store::DocumentStore;
use super::transform::UnknownCategory;
use super::transformation::{DataTransformation, TransformationStats};
use super::validation::DataValidation;
use crate::report::run_report::RunReport;

/// Tunable knobs of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSettings {
    pub database: String,
    pub collection: String,
    pub schema_path: PathBuf,
    pub test_size: f64,
    pub split_seed: u64,
    /// Stratify the split on the schema target instead of one plain shuffle.
    pub stratify: bool,
    pub handle_unknown: UnknownCategory,
    pub resampler: SmoteEnn,
    /// Write `run_report.json` after a successful run.
    pub write_report: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            database: DATABASE_NAME.to_string(),
            collection: COLLECTION_NAME.to_string(),
            schema_path: PathBuf::from(SCHEMA_FILE_PATH),
            test_size: DATA_INGESTION_TEST_SIZE,
            split_seed: DATA_INGESTION_SPLIT_SEED,
            stratify: false,
            handle_unknown: UnknownCategory::default(),
            resampler: SmoteEnn::default(),
            write_report: true,
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub ingestion: DataIngestionArtifact,
    pub validation: DataValidationArtifact,
    pub transformation: DataTransformationArtifact,
    pub stats: TransformationStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

pub struct TrainingPipeline<'a> {
    ctx: RunContext,
    settings: PipelineSettings,
    schema: Schema,
    store: &'a dyn DocumentStore,
}

impl<'a> TrainingPipeline<'a> {
    /// Load the schema named in `settings` and prepare a run.
    pub fn new(
        ctx: RunContext,
        settings: PipelineSettings,
        store: &'a dyn DocumentStore,
    ) -> Result<Self> {
        let schema = Schema::from_yaml_file(&settings.schema_path)?;
        Ok(Self::with_schema(ctx, settings, schema, store))
    }

    pub fn with_schema(
        ctx: RunContext,
        settings: PipelineSettings,
        schema: Schema,
        store: &'a dyn DocumentStore,
    ) -> Self {
        Self {
            ctx,
            settings,
            schema,
            store,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn ingestion_config(&self) -> DataIngestionConfig {
        let mut config = DataIngestionConfig::new(&self.ctx);
        config.collection_name = self.settings.collection.clone();
        config.test_size = self.settings.test_size;
        config.split_seed = self.settings.split_seed;
        config.split_strategy = if self.settings.stratify {
            SplitStrategy::Stratified {
                column: self.schema.target_column().to_string(),
            }
        } else {
            SplitStrategy::Shuffle
        };
        config
    }

    fn transformation_config(&self) -> DataTransformationConfig {
        let mut config = DataTransformationConfig::new(&self.ctx);
        config.handle_unknown = self.settings.handle_unknown;
        config.resampler = self.settings.resampler.clone();
        config
    }

    pub fn start_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        tracing::info!("getting the data from the document store");
        DataIngestion::new(self.ingestion_config(), self.store, &self.settings.database)
            .run()
            .map_err(|e| e.in_stage(Stage::Ingestion))
    }

    pub fn start_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        DataValidation::new(
            ingestion.clone(),
            DataValidationConfig::new(&self.ctx),
            &self.schema,
        )
        .run()
        .map_err(|e| e.in_stage(Stage::Validation))
    }

    pub fn start_data_transformation(
        &self,
        ingestion: &DataIngestionArtifact,
        validation: &DataValidationArtifact,
    ) -> Result<(DataTransformationArtifact, TransformationStats)> {
        DataTransformation::new(
            ingestion.clone(),
            validation.clone(),
            self.transformation_config(),
            &self.schema,
        )
        .run_detailed()
        .map_err(|e| e.in_stage(Stage::Transformation))
    }

    /// Bundle the stage results and write the run report if enabled.
    pub fn finish(
        &self,
        ingestion: DataIngestionArtifact,
        validation: DataValidationArtifact,
        transformation: DataTransformationArtifact,
        stats: TransformationStats,
    ) -> Result<PipelineOutcome> {
        let mut outcome = PipelineOutcome {
            ingestion,
            validation,
            transformation,
            stats,
            report_path: None,
        };
        if self.settings.write_report {
            let path = self.ctx.run_report_path();
            RunReport::new(&self.ctx, &self.settings, &outcome).save(&path)?;
            outcome.report_path = Some(path);
        }
        Ok(outcome)
    }

    pub fn run_pipeline(&self) -> Result<PipelineOutcome> {
        tracing::info!(
            run = %self.ctx.timestamp,
            artifact_dir = %self.ctx.artifact_dir.display(),
            "starting training pipeline"
        );
        let ingestion = self.start_data_ingestion()?;
        let validation = self.start_data_validation(&ingestion)?;
        let (transformation, stats) = self.start_data_transformation(&ingestion, &validation)?;

        let outcome = self.finish(ingestion, validation, transformation, stats)?;
        tracing::info!("training pipeline finished");
        Ok(outcome)
    }
}
