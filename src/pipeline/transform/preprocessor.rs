//! Schema-driven preprocessing plan and its fitted form

use std::path::Path;

use faer::Mat;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::encoders::{OneHotEncoder, OrdinalEncoder};
use super::power::PowerTransformer;
use super::scaler::StandardScaler;
use super::{category_values, numeric_values, TransformError, UnknownCategory};
use crate::pipeline::error::Result;
use crate::pipeline::schema::{ColumnGroup, Schema};
use crate::utils::persist::{load_object, save_object};

/// One group of columns sharing a transformer kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessStep {
    pub group: ColumnGroup,
    pub columns: Vec<String>,
}

/// Unfitted preprocessing plan.
///
/// Steps run in [`ColumnGroup::ALL`] order and output columns follow the
/// schema order within each group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    steps: Vec<PreprocessStep>,
    handle_unknown: UnknownCategory,
}

impl Preprocessor {
    pub fn from_schema(schema: &Schema, handle_unknown: UnknownCategory) -> Self {
        let steps = ColumnGroup::ALL
            .iter()
            .map(|&group| PreprocessStep {
                group,
                columns: schema.group(group).to_vec(),
            })
            .filter(|step| !step.columns.is_empty())
            .collect();
        Self {
            steps,
            handle_unknown,
        }
    }

    pub fn steps(&self) -> &[PreprocessStep] {
        &self.steps
    }

    pub fn handle_unknown(&self) -> UnknownCategory {
        self.handle_unknown
    }

    /// Columns the plan reads, in output order.
    pub fn input_columns(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flat_map(|s| s.columns.iter().map(String::as_str))
            .collect()
    }

    /// Learn every transformer's parameters from `df`.
    pub fn fit(&self, df: &DataFrame) -> std::result::Result<FittedPreprocessor, TransformError> {
        let mut fitted = Vec::new();
        for step in &self.steps {
            for column in &step.columns {
                let transformer = match step.group {
                    ColumnGroup::OneHot => FittedColumn::OneHot(OneHotEncoder::fit(
                        column,
                        &category_values(df, column)?,
                        self.handle_unknown,
                    )),
                    ColumnGroup::Ordinal => FittedColumn::Ordinal(OrdinalEncoder::fit(
                        column,
                        &category_values(df, column)?,
                        self.handle_unknown,
                    )),
                    ColumnGroup::PowerTransform => FittedColumn::PowerTransform(
                        PowerTransformer::fit(column, &numeric_values(df, column)?)?,
                    ),
                    ColumnGroup::StandardScale => FittedColumn::StandardScale(
                        StandardScaler::fit(column, &numeric_values(df, column)?)?,
                    ),
                };
                fitted.push(transformer);
            }
        }
        tracing::debug!(transformers = fitted.len(), "fitted preprocessor");
        Ok(FittedPreprocessor { columns: fitted })
    }

    pub fn fit_transform(
        &self,
        df: &DataFrame,
    ) -> std::result::Result<(FittedPreprocessor, Mat<f64>), TransformError> {
        let fitted = self.fit(df)?;
        let matrix = fitted.transform(df)?;
        Ok((fitted, matrix))
    }
}

/// A fitted per-column transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedColumn {
    OneHot(OneHotEncoder),
    Ordinal(OrdinalEncoder),
    PowerTransform(PowerTransformer),
    StandardScale(StandardScaler),
}

impl FittedColumn {
    pub fn column(&self) -> &str {
        match self {
            FittedColumn::OneHot(t) => t.column(),
            FittedColumn::Ordinal(t) => t.column(),
            FittedColumn::PowerTransform(t) => t.column(),
            FittedColumn::StandardScale(t) => t.column(),
        }
    }

    pub fn group(&self) -> ColumnGroup {
        match self {
            FittedColumn::OneHot(_) => ColumnGroup::OneHot,
            FittedColumn::Ordinal(_) => ColumnGroup::Ordinal,
            FittedColumn::PowerTransform(_) => ColumnGroup::PowerTransform,
            FittedColumn::StandardScale(_) => ColumnGroup::StandardScale,
        }
    }

    pub fn n_outputs(&self) -> usize {
        match self {
            FittedColumn::OneHot(t) => t.n_outputs(),
            _ => 1,
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        match self {
            FittedColumn::OneHot(t) => t.feature_names(),
            other => vec![other.column().to_string()],
        }
    }

    fn transform(&self, df: &DataFrame) -> std::result::Result<Vec<Vec<f64>>, TransformError> {
        let column = self.column();
        Ok(match self {
            FittedColumn::OneHot(t) => t.transform(&category_values(df, column)?)?,
            FittedColumn::Ordinal(t) => vec![t.transform(&category_values(df, column)?)?],
            FittedColumn::PowerTransform(t) => vec![t.transform(&numeric_values(df, column)?)],
            FittedColumn::StandardScale(t) => vec![t.transform(&numeric_values(df, column)?)],
        })
    }
}

/// Preprocessor with learned parameters, applied identically to train and test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    columns: Vec<FittedColumn>,
}

impl FittedPreprocessor {
    pub fn transformers(&self) -> &[FittedColumn] {
        &self.columns
    }

    pub fn n_features_out(&self) -> usize {
        self.columns.iter().map(FittedColumn::n_outputs).sum()
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(FittedColumn::feature_names)
            .collect()
    }

    /// Apply the fitted transformers to `df`, one row per input row.
    pub fn transform(&self, df: &DataFrame) -> std::result::Result<Mat<f64>, TransformError> {
        let mut matrix = Mat::<f64>::zeros(df.height(), self.n_features_out());
        let mut offset = 0;
        for transformer in &self.columns {
            for (j, values) in transformer.transform(df)?.into_iter().enumerate() {
                for (i, v) in values.into_iter().enumerate() {
                    matrix[(i, offset + j)] = v;
                }
            }
            offset += transformer.n_outputs();
        }
        Ok(matrix)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_object(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_object(path)
    }
}
