//! One-hot and ordinal encoders for categorical columns

use serde::{Deserialize, Serialize};

use super::{compare_categories, display_category, Category, TransformError, UnknownCategory};

/// Sorted distinct categories of `values`, missing last.
fn learn_categories(values: &[Category]) -> Vec<Category> {
    let mut categories = values.to_vec();
    categories.sort_by(compare_categories);
    categories.dedup();
    categories
}

fn position(categories: &[Category], value: &Category) -> Option<usize> {
    categories
        .binary_search_by(|c| compare_categories(c, value))
        .ok()
}

/// Indicator encoding: one output column per category seen during fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<Category>,
    handle_unknown: UnknownCategory,
}

impl OneHotEncoder {
    pub fn fit(column: &str, values: &[Category], handle_unknown: UnknownCategory) -> Self {
        Self {
            column: column.to_string(),
            categories: learn_categories(values),
            handle_unknown,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn n_outputs(&self) -> usize {
        self.categories.len()
    }

    /// `<column>_<category>` for each output, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.column, display_category(c)))
            .collect()
    }

    /// Encode `values`, returning one vector per output column.
    pub fn transform(&self, values: &[Category]) -> Result<Vec<Vec<f64>>, TransformError> {
        let mut outputs = vec![vec![0.0; values.len()]; self.categories.len()];
        for (row, value) in values.iter().enumerate() {
            match position(&self.categories, value) {
                Some(idx) => outputs[idx][row] = 1.0,
                None => match self.handle_unknown {
                    UnknownCategory::Ignore => {}
                    UnknownCategory::Error => {
                        return Err(TransformError::UnknownCategory {
                            column: self.column.clone(),
                            value: display_category(value),
                        })
                    }
                },
            }
        }
        Ok(outputs)
    }
}

/// Integer rank encoding: each category maps to its index in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    column: String,
    categories: Vec<Category>,
    handle_unknown: UnknownCategory,
}

/// Code emitted for an unseen category under [`UnknownCategory::Ignore`].
pub const UNKNOWN_ORDINAL: f64 = -1.0;

impl OrdinalEncoder {
    pub fn fit(column: &str, values: &[Category], handle_unknown: UnknownCategory) -> Self {
        Self {
            column: column.to_string(),
            categories: learn_categories(values),
            handle_unknown,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn transform(&self, values: &[Category]) -> Result<Vec<f64>, TransformError> {
        values
            .iter()
            .map(|value| match position(&self.categories, value) {
                Some(idx) => Ok(idx as f64),
                None => match self.handle_unknown {
                    UnknownCategory::Ignore => Ok(UNKNOWN_ORDINAL),
                    UnknownCategory::Error => Err(TransformError::UnknownCategory {
                        column: self.column.clone(),
                        value: display_category(value),
                    }),
                },
            })
            .collect()
    }
}
