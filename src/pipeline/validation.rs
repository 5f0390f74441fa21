//! Validation stage: structural checks on the train and test splits
//!
//! Each split gets a column-count check and a required-columns check. All four
//! checks always run; the artifact message lists every failed check in a fixed
//! order, so the outcome does not depend on which split is inspected first.

use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use super::artifact::{DataIngestionArtifact, DataValidationArtifact};
use super::config::DataValidationConfig;
use super::error::Result;
use super::loader::{column_names, read_table};
use super::schema::Schema;
use crate::utils::persist::write_yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => f.write_str("train"),
            Split::Test => f.write_str("test"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    ColumnCount,
    RequiredColumns,
}

/// Message contributed to the artifact when `check` fails on `split`.
pub fn failure_message(split: Split, check: Check) -> &'static str {
    match (split, check) {
        (Split::Train, Check::ColumnCount) => "Training data column count validation FAILED.",
        (Split::Test, Check::ColumnCount) => "Testing data column count validation FAILED.",
        (Split::Train, Check::RequiredColumns) => "Required columns missing in training data",
        (Split::Test, Check::RequiredColumns) => "Required columns missing in testing data",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub split: Split,
    pub check: Check,
    pub passed: bool,
    /// Required columns absent from the split; empty for count checks.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_columns: Vec<String>,
}

/// Contents of `data_validation/report.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub expected_column_count: usize,
    pub checks: Vec<CheckOutcome>,
    pub validation_status: bool,
    pub message: String,
}

/// Fold check outcomes into an artifact: pass iff nothing failed.
pub fn summarize(outcomes: &[CheckOutcome]) -> DataValidationArtifact {
    let message = outcomes
        .iter()
        .filter(|o| !o.passed)
        .map(|o| failure_message(o.split, o.check))
        .collect::<Vec<_>>()
        .join(" ");
    DataValidationArtifact {
        validation_status: message.is_empty(),
        message,
    }
}

pub struct DataValidation<'a> {
    ingestion_artifact: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: &'a Schema,
}

impl<'a> DataValidation<'a> {
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: &'a Schema,
    ) -> Self {
        Self {
            ingestion_artifact,
            config,
            schema,
        }
    }

    /// True when `df` has exactly as many columns as the schema declares.
    pub fn validate_number_of_columns(&self, df: &DataFrame) -> bool {
        let status = df.width() == self.schema.expected_column_count();
        tracing::info!(
            found = df.width(),
            expected = self.schema.expected_column_count(),
            status,
            "column count check"
        );
        status
    }

    /// Required numerical and categorical columns that `df` lacks.
    pub fn missing_required_columns(&self, df: &DataFrame) -> Vec<String> {
        let present = column_names(df);
        let missing_in = |required: &[String]| -> Vec<String> {
            required
                .iter()
                .filter(|c| !present.contains(c))
                .cloned()
                .collect()
        };

        let numerical = missing_in(self.schema.numerical_columns());
        if !numerical.is_empty() {
            tracing::warn!(columns = ?numerical, "missing numerical columns");
        }
        let categorical = missing_in(self.schema.categorical_columns());
        if !categorical.is_empty() {
            tracing::warn!(columns = ?categorical, "missing categorical columns");
        }

        numerical.into_iter().chain(categorical).collect()
    }

    pub fn has_required_columns(&self, df: &DataFrame) -> bool {
        self.missing_required_columns(df).is_empty()
    }

    pub fn check(&self, split: Split, check: Check, df: &DataFrame) -> CheckOutcome {
        let (passed, missing_columns) = match check {
            Check::ColumnCount => (self.validate_number_of_columns(df), Vec::new()),
            Check::RequiredColumns => {
                let missing = self.missing_required_columns(df);
                (missing.is_empty(), missing)
            }
        };
        let result = if passed { "PASSED" } else { "FAILED" };
        tracing::info!(%split, ?check, result, "validation check");
        CheckOutcome {
            split,
            check,
            passed,
            missing_columns,
        }
    }

    /// Run all four checks over already-loaded splits.
    pub fn validate_frames(&self, train: &DataFrame, test: &DataFrame) -> Vec<CheckOutcome> {
        vec![
            self.check(Split::Train, Check::ColumnCount, train),
            self.check(Split::Test, Check::ColumnCount, test),
            self.check(Split::Train, Check::RequiredColumns, train),
            self.check(Split::Test, Check::RequiredColumns, test),
        ]
    }

    pub fn run(&self) -> Result<DataValidationArtifact> {
        tracing::info!("starting data validation");
        let train = read_table(&self.ingestion_artifact.train_file_path)?;
        let test = read_table(&self.ingestion_artifact.test_file_path)?;

        let outcomes = self.validate_frames(&train, &test);
        let artifact = summarize(&outcomes);

        let report = ValidationReport {
            expected_column_count: self.schema.expected_column_count(),
            checks: outcomes,
            validation_status: artifact.validation_status,
            message: artifact.message.clone(),
        };
        write_yaml(&self.config.report_file_path, &report)?;

        if artifact.validation_status {
            tracing::info!(?artifact, "data validation passed");
        } else {
            tracing::warn!(message = %artifact.message, "data validation failed");
        }
        Ok(artifact)
    }
}
