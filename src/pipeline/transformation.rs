//! Transformation stage: features, preprocessing, resampling, persistence
//!
//! The stage is gated on the validation artifact. A failed validation aborts
//! before any file is read or written.

use faer::Mat;
use polars::prelude::*;
use serde::Serialize;

use super::artifact::{DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact};
use super::config::DataTransformationConfig;
use super::error::{PipelineError, Result};
use super::loader::{column_names, read_table};
use super::resample::ResampleReport;
use super::schema::{DerivedAge, Schema};
use super::target::{encode_target, TargetValueMapping};
use super::transform::{numeric_values, Preprocessor};
use crate::utils::npy::save_numpy_array;

/// Shape summary of one transformation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformationStats {
    pub train_rows_in: usize,
    pub train_rows_out: usize,
    pub test_rows: usize,
    pub feature_names: Vec<String>,
    pub resample: ResampleReport,
}

impl TransformationStats {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

pub struct DataTransformation<'a> {
    ingestion_artifact: DataIngestionArtifact,
    validation_artifact: DataValidationArtifact,
    config: DataTransformationConfig,
    schema: &'a Schema,
    target_mapping: TargetValueMapping,
}

impl<'a> DataTransformation<'a> {
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        validation_artifact: DataValidationArtifact,
        config: DataTransformationConfig,
        schema: &'a Schema,
    ) -> Self {
        Self {
            ingestion_artifact,
            validation_artifact,
            config,
            schema,
            target_mapping: TargetValueMapping::default(),
        }
    }

    pub fn with_target_mapping(mut self, mapping: TargetValueMapping) -> Self {
        self.target_mapping = mapping;
        self
    }

    /// Unfitted preprocessing plan for the schema's column groups.
    pub fn build_preprocessor(&self) -> Preprocessor {
        Preprocessor::from_schema(self.schema, self.config.handle_unknown)
    }

    /// Separate the target, add derived columns and drop excluded ones.
    pub fn split_features_and_target(&self, df: &DataFrame) -> Result<(DataFrame, Vec<i64>)> {
        let target_column = self.schema.target_column();
        let target = encode_target(df, target_column, &self.target_mapping)?;

        let mut features = df.drop(target_column)?;
        add_derived_columns(
            &mut features,
            self.schema.derived_columns(),
            self.config.reference_year,
        )?;

        for column in self.schema.drop_columns() {
            if features.column(column).is_ok() {
                features = features.drop(column)?;
            } else {
                tracing::debug!(column = %column, "drop column not present");
            }
        }
        Ok((features, target))
    }

    pub fn run(&self) -> Result<DataTransformationArtifact> {
        self.run_detailed().map(|(artifact, _)| artifact)
    }

    /// Run the stage and also return shape statistics for reporting.
    pub fn run_detailed(&self) -> Result<(DataTransformationArtifact, TransformationStats)> {
        if !self.validation_artifact.validation_status {
            tracing::warn!(
                message = %self.validation_artifact.message,
                "refusing to transform data that failed validation"
            );
            return Err(PipelineError::ValidationFailed {
                message: self.validation_artifact.message.clone(),
            });
        }
        tracing::info!("starting data transformation");

        let preprocessor = self.build_preprocessor();

        let train_df = read_table(&self.ingestion_artifact.train_file_path)?;
        let test_df = read_table(&self.ingestion_artifact.test_file_path)?;

        let (train_features, train_target) = self.split_features_and_target(&train_df)?;
        let (test_features, test_target) = self.split_features_and_target(&test_df)?;
        tracing::info!(
            features = ?column_names(&train_features),
            "separated input features and encoded target"
        );

        let (fitted, train_arr) = preprocessor.fit_transform(&train_features)?;
        tracing::info!("fitted and transformed training features");
        let test_arr = fitted.transform(&test_features)?;
        tracing::info!("transformed testing features");

        let (train_final, train_target_final, resample) = self
            .config
            .resampler
            .fit_resample(&train_arr, &train_target)?;

        let train_out = append_target(&train_final, &train_target_final);
        let test_out = append_target(&test_arr, &test_target);

        fitted.save(&self.config.transformed_object_file_path)?;
        save_numpy_array(&self.config.transformed_train_file_path, &train_out)?;
        save_numpy_array(&self.config.transformed_test_file_path, &test_out)?;
        tracing::info!("saved preprocessor and transformed arrays");

        let stats = TransformationStats {
            train_rows_in: train_df.height(),
            train_rows_out: train_out.nrows(),
            test_rows: test_out.nrows(),
            feature_names: fitted.feature_names_out(),
            resample,
        };
        let artifact = DataTransformationArtifact {
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
        };
        tracing::info!(?artifact, "exited data transformation");
        Ok((artifact, stats))
    }
}

/// Add each `reference_year - <age_of>` column to `df`.
pub fn add_derived_columns(
    df: &mut DataFrame,
    derived: &[DerivedAge],
    reference_year: i32,
) -> Result<()> {
    for d in derived {
        let source = numeric_values(df, &d.age_of)?;
        let ages: Vec<f64> = source
            .iter()
            .map(|year| f64::from(reference_year) - year)
            .collect();
        df.with_column(Column::new(d.name.as_str().into(), ages))?;
    }
    Ok(())
}

/// `x` with `target` appended as the last column.
pub fn append_target(x: &Mat<f64>, target: &[i64]) -> Mat<f64> {
    let cols = x.ncols();
    let mut out = Mat::<f64>::zeros(x.nrows(), cols + 1);
    for i in 0..x.nrows() {
        for j in 0..cols {
            out[(i, j)] = x[(i, j)];
        }
        out[(i, cols)] = target[i] as f64;
    }
    out
}
