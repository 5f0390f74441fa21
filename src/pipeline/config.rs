//! Run context and per-stage configuration
//!
//! Every artifact of one run lives under `<artifact_root>/<timestamp>/`, with a
//! fixed relative layout per stage so downstream stages can locate upstream
//! output purely from the recorded artifact paths.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDateTime};
use serde::Serialize;

use super::resample::SmoteEnn;
use super::transform::UnknownCategory;

pub const PIPELINE_NAME: &str = "usvisa";
pub const ARTIFACT_DIR: &str = "artifact";
pub const DATABASE_NAME: &str = "us_visa";
pub const COLLECTION_NAME: &str = "visa_data";
pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";

pub const FILE_NAME: &str = "usvisa.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const TRAIN_ARRAY_FILE_NAME: &str = "train.npy";
pub const TEST_ARRAY_FILE_NAME: &str = "test.npy";
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.json";
pub const RUN_REPORT_FILE_NAME: &str = "run_report.json";

pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_TEST_SIZE: f64 = 0.2;
pub const DATA_INGESTION_SPLIT_SEED: u64 = 42;

pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_REPORT_FILE_NAME: &str = "report.yaml";

pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const DATA_TRANSFORMATION_TRANSFORMED_DIR: &str = "transformed";
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";

/// Format of the run timestamp embedded in the artifact directory name.
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Identity of one pipeline run.
///
/// Captured once by the orchestrator and handed to every stage config, so all
/// stages of a run agree on the artifact directory and the reference year used
/// for derived age features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContext {
    pub pipeline_name: String,
    pub timestamp: String,
    pub artifact_dir: PathBuf,
    pub reference_year: i32,
}

impl RunContext {
    /// Create a context for a run starting now.
    pub fn new(artifact_root: impl AsRef<Path>) -> Self {
        Self::started_at(artifact_root, Local::now().naive_local())
    }

    /// Create a context for a run that started at `started`.
    pub fn started_at(artifact_root: impl AsRef<Path>, started: NaiveDateTime) -> Self {
        let timestamp = started.format(TIMESTAMP_FORMAT).to_string();
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: artifact_root.as_ref().join(&timestamp),
            timestamp,
            reference_year: started.year(),
        }
    }

    /// Root directory of one stage's output.
    pub fn stage_dir(&self, name: &str) -> PathBuf {
        self.artifact_dir.join(name)
    }

    pub fn run_report_path(&self) -> PathBuf {
        self.artifact_dir.join(RUN_REPORT_FILE_NAME)
    }
}

/// How rows are assigned to the train and test splits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SplitStrategy {
    /// One seeded shuffle of all rows.
    Shuffle,
    /// Seeded shuffle within each class of `column`, preserving class ratios.
    Stratified { column: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub test_size: f64,
    pub split_seed: u64,
    pub split_strategy: SplitStrategy,
    pub collection_name: String,
}

impl DataIngestionConfig {
    pub fn new(ctx: &RunContext) -> Self {
        let data_ingestion_dir = ctx.stage_dir(DATA_INGESTION_DIR_NAME);
        Self {
            feature_store_file_path: data_ingestion_dir
                .join(DATA_INGESTION_FEATURE_STORE_DIR)
                .join(FILE_NAME),
            training_file_path: data_ingestion_dir
                .join(DATA_INGESTION_INGESTED_DIR)
                .join(TRAIN_FILE_NAME),
            testing_file_path: data_ingestion_dir
                .join(DATA_INGESTION_INGESTED_DIR)
                .join(TEST_FILE_NAME),
            data_ingestion_dir,
            test_size: DATA_INGESTION_TEST_SIZE,
            split_seed: DATA_INGESTION_SPLIT_SEED,
            split_strategy: SplitStrategy::Shuffle,
            collection_name: COLLECTION_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub report_file_path: PathBuf,
}

impl DataValidationConfig {
    pub fn new(ctx: &RunContext) -> Self {
        let data_validation_dir = ctx.stage_dir(DATA_VALIDATION_DIR_NAME);
        Self {
            report_file_path: data_validation_dir.join(DATA_VALIDATION_REPORT_FILE_NAME),
            data_validation_dir,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataTransformationConfig {
    pub data_transformation_dir: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
    /// Year that derived age columns are measured from.
    pub reference_year: i32,
    pub handle_unknown: UnknownCategory,
    pub resampler: SmoteEnn,
}

impl DataTransformationConfig {
    pub fn new(ctx: &RunContext) -> Self {
        let data_transformation_dir = ctx.stage_dir(DATA_TRANSFORMATION_DIR_NAME);
        let transformed_dir = data_transformation_dir.join(DATA_TRANSFORMATION_TRANSFORMED_DIR);
        Self {
            transformed_train_file_path: transformed_dir.join(TRAIN_ARRAY_FILE_NAME),
            transformed_test_file_path: transformed_dir.join(TEST_ARRAY_FILE_NAME),
            transformed_object_file_path: data_transformation_dir
                .join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR)
                .join(PREPROCESSING_OBJECT_FILE_NAME),
            data_transformation_dir,
            reference_year: ctx.reference_year,
            handle_unknown: UnknownCategory::default(),
            resampler: SmoteEnn::default(),
        }
    }
}
