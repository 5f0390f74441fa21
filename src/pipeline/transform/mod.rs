//! Column preprocessing
//!
//! Each schema group is handled by one per-column transformer:
//!
//! - one-hot encoding for `oh_columns`
//! - ordinal encoding for `or_columns`
//! - Yeo-Johnson power transform for `transform_columns`
//! - standard scaling for `num_features`
//!
//! [`Preprocessor`] is the unfitted plan built from a schema. Fitting it on a
//! frame yields a [`FittedPreprocessor`], which is the persisted object.

pub mod encoders;
pub mod power;
pub mod preprocessor;
pub mod scaler;

pub use encoders::{OneHotEncoder, OrdinalEncoder};
pub use power::PowerTransformer;
pub use preprocessor::{FittedColumn, FittedPreprocessor, PreprocessStep, Preprocessor};
pub use scaler::StandardScaler;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("column '{0}' not found in frame")]
    MissingColumn(String),

    #[error("column '{column}' has a missing value at row {row}")]
    NullValue { column: String, row: usize },

    #[error("column '{column}' must be numeric, found {dtype}")]
    NonNumeric { column: String, dtype: String },

    #[error("column '{column}' has category {value} that was not seen during fitting")]
    UnknownCategory { column: String, value: String },

    #[error("target column '{0}' is empty")]
    EmptyTarget(String),

    #[error("target column '{column}' has unmapped labels: {}", .labels.join(", "))]
    UnknownTargetLabels { column: String, labels: Vec<String> },

    #[error("cannot fit '{column}' on an empty frame")]
    EmptyFit { column: String },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// Policy for categories that were not seen while fitting an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategory {
    /// Fail the transform.
    #[default]
    Error,
    /// Encode as all zeros (one-hot) or -1 (ordinal).
    Ignore,
}

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownCategory::Error => f.write_str("error"),
            UnknownCategory::Ignore => f.write_str("ignore"),
        }
    }
}

impl FromStr for UnknownCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(UnknownCategory::Error),
            "ignore" => Ok(UnknownCategory::Ignore),
            other => Err(format!("expected 'error' or 'ignore', got '{}'", other)),
        }
    }
}

/// A category value; `None` is the missing-value category.
pub type Category = Option<String>;

/// Category order used by both encoders: lexicographic, missing last.
pub(crate) fn compare_categories(a: &Category, b: &Category) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Render a category for feature names and error messages.
pub(crate) fn display_category(category: &Category) -> String {
    match category {
        Some(value) => value.clone(),
        None => "nan".to_string(),
    }
}

/// Values of a categorical column as strings, nulls preserved.
pub(crate) fn category_values(df: &DataFrame, column: &str) -> Result<Vec<Category>, TransformError> {
    let col = df
        .column(column)
        .map_err(|_| TransformError::MissingColumn(column.to_string()))?;
    let as_str = col.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Values of a numeric column as `f64`. Nulls and non-numeric columns are errors.
pub(crate) fn numeric_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, TransformError> {
    let col = df
        .column(column)
        .map_err(|_| TransformError::MissingColumn(column.to_string()))?;
    if !col.dtype().is_primitive_numeric() {
        return Err(TransformError::NonNumeric {
            column: column.to_string(),
            dtype: col.dtype().to_string(),
        });
    }
    let as_float = col.cast(&DataType::Float64)?;
    as_float
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| TransformError::NullValue {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

/// Population mean and standard deviation.
pub(crate) fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
