//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::config::{
    ARTIFACT_DIR, COLLECTION_NAME, DATABASE_NAME, DATA_INGESTION_SPLIT_SEED, SCHEMA_FILE_PATH,
};
use crate::pipeline::resample::{DEFAULT_ENN_NEIGHBORS, DEFAULT_K_NEIGHBORS, DEFAULT_RESAMPLE_SEED};
use crate::pipeline::{PipelineSettings, SmoteEnn, UnknownCategory};

/// visaprep - ingest, validate and transform visa application data for model training
#[derive(Parser, Debug)]
#[command(name = "visaprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for the JSON log file
    #[arg(long, default_value = "logs", global = true)]
    pub log_dir: PathBuf,

    /// Do not write a log file
    #[arg(long, default_value = "false", global = true)]
    pub no_log_file: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run ingestion, validation and transformation end to end
    Run(RunArgs),

    /// Validate a schema file and print its column groups
    CheckSchema {
        /// Schema YAML file
        #[arg(long, default_value = SCHEMA_FILE_PATH)]
        schema: PathBuf,
    },

    /// Print the shape of a transformed .npy array or a preprocessor summary
    Inspect {
        /// Path to a .npy array or a persisted preprocessor (.json)
        path: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Root directory of the document store
    #[arg(long, env = "VISAPREP_STORE")]
    pub store: PathBuf,

    /// Database holding the source collection
    #[arg(long, default_value = DATABASE_NAME)]
    pub database: String,

    /// Collection to export
    #[arg(long, default_value = COLLECTION_NAME)]
    pub collection: String,

    /// Schema YAML file
    #[arg(long, default_value = SCHEMA_FILE_PATH)]
    pub schema: PathBuf,

    /// Directory under which the timestamped run directory is created
    #[arg(long, default_value = ARTIFACT_DIR)]
    pub artifact_root: PathBuf,

    /// Fraction of rows held out for testing, strictly between 0 and 1
    #[arg(long, default_value = "0.2", value_parser = validate_test_size)]
    pub test_size: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = DATA_INGESTION_SPLIT_SEED)]
    pub seed: u64,

    /// Shuffle each target class separately so both splits keep the class ratio
    #[arg(long, default_value = "false")]
    pub stratify: bool,

    /// What encoders do with categories unseen during fitting: "error" or "ignore"
    #[arg(long, default_value = "error")]
    pub handle_unknown: UnknownCategory,

    /// Neighbours used by SMOTE when interpolating minority samples
    #[arg(long, default_value_t = DEFAULT_K_NEIGHBORS, value_parser = validate_neighbors)]
    pub smote_neighbors: usize,

    /// Neighbours that must agree for ENN to keep a sample
    #[arg(long, default_value_t = DEFAULT_ENN_NEIGHBORS, value_parser = validate_neighbors)]
    pub enn_neighbors: usize,

    /// Seed for synthetic sample generation
    #[arg(long, default_value_t = DEFAULT_RESAMPLE_SEED)]
    pub resample_seed: u64,

    /// Skip writing run_report.json
    #[arg(long, default_value = "false")]
    pub no_report: bool,
}

impl RunArgs {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            database: self.database.clone(),
            collection: self.collection.clone(),
            schema_path: self.schema.clone(),
            test_size: self.test_size,
            split_seed: self.seed,
            stratify: self.stratify,
            handle_unknown: self.handle_unknown,
            resampler: SmoteEnn::new(self.smote_neighbors, self.enn_neighbors, self.resample_seed),
            write_report: !self.no_report,
        }
    }
}

/// Validator for test_size parameter
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_size must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for neighbour counts
fn validate_neighbors(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;

    if value == 0 {
        Err("neighbour count must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
