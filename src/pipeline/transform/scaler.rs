//! Standard scaling of numeric columns

use serde::{Deserialize, Serialize};

use super::{mean_and_std, TransformError};

/// Centers on the fitted mean and divides by the fitted population std.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    column: String,
    mean: f64,
    scale: f64,
}

impl StandardScaler {
    /// A zero-variance column gets scale 1, so it maps to all zeros.
    pub fn fit(column: &str, values: &[f64]) -> Result<Self, TransformError> {
        if values.is_empty() {
            return Err(TransformError::EmptyFit {
                column: column.to_string(),
            });
        }
        let (mean, std) = mean_and_std(values);
        Ok(Self {
            column: column.to_string(),
            mean,
            scale: if std > 0.0 { std } else { 1.0 },
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| (v - self.mean) / self.scale).collect()
    }
}
