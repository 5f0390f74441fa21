//! Target column analysis and label encoding
//!
//! The raw target holds case outcomes as text. Modeling needs integer class
//! codes, so each label is mapped through a [`TargetValueMapping`]. A column
//! that already holds valid codes passes through unchanged.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::transform::TransformError;

/// Tolerance for floating point comparison when checking integral codes
const TOLERANCE: f64 = 1e-9;

/// Fixed label-to-code table for the target column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetValueMapping {
    labels: Vec<(String, i64)>,
}

impl Default for TargetValueMapping {
    fn default() -> Self {
        Self::new(vec![("Certified".to_string(), 0), ("Denied".to_string(), 1)])
    }
}

impl TargetValueMapping {
    pub fn new(labels: Vec<(String, i64)>) -> Self {
        Self { labels }
    }

    pub fn code_for(&self, label: &str) -> Option<i64> {
        self.labels
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, code)| *code)
    }

    pub fn label_for(&self, code: i64) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(label, _)| label.as_str())
    }

    /// Code-to-label view, for decoding predictions.
    pub fn reverse(&self) -> BTreeMap<i64, String> {
        self.labels
            .iter()
            .map(|(label, code)| (*code, label.clone()))
            .collect()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_code(&self, code: i64) -> bool {
        self.labels.iter().any(|(_, c)| *c == code)
    }
}

/// Result of analyzing a target column
#[derive(Debug, Clone, PartialEq)]
pub enum TargetEncoding {
    /// Column already holds mapped integer codes
    AlreadyEncoded,
    /// Column holds labels; these are its distinct values, sorted
    NeedsMapping { unique_values: Vec<String> },
}

/// Decide whether `target` already holds codes of `mapping` or needs mapping.
pub fn analyze_target_column(
    df: &DataFrame,
    target: &str,
    mapping: &TargetValueMapping,
) -> Result<TargetEncoding, TransformError> {
    let target_col = df
        .column(target)
        .map_err(|_| TransformError::MissingColumn(target.to_string()))?;

    if target_col.len() == 0 {
        return Err(TransformError::EmptyTarget(target.to_string()));
    }
    if target_col.null_count() == target_col.len() {
        return Err(TransformError::NullValue {
            column: target.to_string(),
            row: 0,
        });
    }

    if target_col.dtype().is_primitive_numeric() {
        let float_col = target_col.cast(&DataType::Float64)?;
        let all_codes = float_col.f64()?.into_iter().flatten().all(|v| {
            (v - v.round()).abs() < TOLERANCE && mapping.is_code(v.round() as i64)
        });
        if all_codes {
            return Ok(TargetEncoding::AlreadyEncoded);
        }
    }

    let mut unique_values: Vec<String> = column_to_string_vec(target_col)?
        .into_iter()
        .flatten()
        .collect();
    unique_values.sort();
    unique_values.dedup();
    Ok(TargetEncoding::NeedsMapping { unique_values })
}

/// Map every value of `target` to its class code.
///
/// Labels outside the mapping are reported together, sorted. A null is an
/// error naming its row.
pub fn encode_target(
    df: &DataFrame,
    target: &str,
    mapping: &TargetValueMapping,
) -> Result<Vec<i64>, TransformError> {
    match analyze_target_column(df, target, mapping)? {
        TargetEncoding::AlreadyEncoded => {
            let col = df.column(target)?.cast(&DataType::Float64)?;
            col.f64()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.map(|v| v.round() as i64).ok_or(TransformError::NullValue {
                        column: target.to_string(),
                        row,
                    })
                })
                .collect()
        }
        TargetEncoding::NeedsMapping { unique_values } => {
            let unmapped: Vec<String> = unique_values
                .into_iter()
                .filter(|label| mapping.code_for(label).is_none())
                .collect();
            if !unmapped.is_empty() {
                return Err(TransformError::UnknownTargetLabels {
                    column: target.to_string(),
                    labels: unmapped,
                });
            }
            let values = column_to_string_vec(df.column(target)?)?;
            values
                .iter()
                .enumerate()
                .map(|(row, v)| match v {
                    // every label was checked above
                    Some(label) => mapping.code_for(label).ok_or_else(|| {
                        TransformError::UnknownTargetLabels {
                            column: target.to_string(),
                            labels: vec![label.clone()],
                        }
                    }),
                    None => Err(TransformError::NullValue {
                        column: target.to_string(),
                        row,
                    }),
                })
                .collect()
        }
    }
}

/// Per-code record counts of an encoded target.
pub fn class_counts(codes: &[i64]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for code in codes {
        *counts.entry(*code).or_insert(0) += 1;
    }
    counts
}

fn column_to_string_vec(col: &Column) -> Result<Vec<Option<String>>, TransformError> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping_codes() {
        let mapping = TargetValueMapping::default();
        assert_eq!(mapping.code_for("Certified"), Some(0));
        assert_eq!(mapping.code_for("Denied"), Some(1));
        assert_eq!(mapping.code_for("Withdrawn"), None);
        assert_eq!(mapping.label_for(1), Some("Denied"));
        assert_eq!(mapping.reverse().get(&0).map(String::as_str), Some("Certified"));
    }

    #[test]
    fn test_analyze_string_target() {
        let df = df! {
            "case_status" => ["Denied", "Certified", "Denied"],
        }
        .unwrap();
        let result = analyze_target_column(&df, "case_status", &TargetValueMapping::default()).unwrap();
        assert_eq!(
            result,
            TargetEncoding::NeedsMapping {
                unique_values: vec!["Certified".to_string(), "Denied".to_string()]
            }
        );
    }

    #[test]
    fn test_analyze_encoded_target() {
        let df = df! {
            "case_status" => [0i64, 1, 1, 0],
        }
        .unwrap();
        let result = analyze_target_column(&df, "case_status", &TargetValueMapping::default()).unwrap();
        assert_eq!(result, TargetEncoding::AlreadyEncoded);
    }

    #[test]
    fn test_non_code_numeric_target_needs_mapping() {
        let df = df! {
            "case_status" => [1i64, 2, 3],
        }
        .unwrap();
        let result = analyze_target_column(&df, "case_status", &TargetValueMapping::default()).unwrap();
        assert!(matches!(result, TargetEncoding::NeedsMapping { .. }));
    }

    #[test]
    fn test_encode_target_maps_labels() {
        let df = df! {
            "case_status" => ["Certified", "Denied", "Certified"],
        }
        .unwrap();
        let codes = encode_target(&df, "case_status", &TargetValueMapping::default()).unwrap();
        assert_eq!(codes, vec![0, 1, 0]);
    }

    #[test]
    fn test_encode_target_is_idempotent() {
        let df = df! {
            "case_status" => [0i64, 1, 0],
        }
        .unwrap();
        let codes = encode_target(&df, "case_status", &TargetValueMapping::default()).unwrap();
        assert_eq!(codes, vec![0, 1, 0]);
    }

    #[test]
    fn test_encode_target_rejects_unknown_label() {
        let df = df! {
            "case_status" => ["Certified", "Withdrawn"],
        }
        .unwrap();
        let err = encode_target(&df, "case_status", &TargetValueMapping::default()).unwrap_err();
        assert!(matches!(err, TransformError::UnknownTargetLabels { ref labels, .. } if labels == &["Withdrawn"]));
    }

    #[test]
    fn test_encode_target_rejects_null() {
        let df = df! {
            "case_status" => [Some("Certified"), None],
        }
        .unwrap();
        let err = encode_target(&df, "case_status", &TargetValueMapping::default()).unwrap_err();
        assert!(matches!(err, TransformError::NullValue { row: 1, .. }));
    }

    #[test]
    fn test_class_counts() {
        let counts = class_counts(&[0, 1, 0, 0]);
        assert_eq!(counts.get(&0), Some(&3));
        assert_eq!(counts.get(&1), Some(&1));
    }
}
