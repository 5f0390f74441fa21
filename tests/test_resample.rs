//! Tests for SMOTE-ENN resampling on preprocessed features

use faer::Mat;
use tempfile::TempDir;
use visaprep::pipeline::resample::nearest_neighbours;
use visaprep::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn column_matrix(values: &[f64]) -> Mat<f64> {
    let mut m = Mat::<f64>::zeros(values.len(), 1);
    for (i, v) in values.iter().enumerate() {
        m[(i, 0)] = *v;
    }
    m
}

/// Preprocessed fixture features with the encoded target
fn preprocessed_fixture() -> (Mat<f64>, Vec<i64>) {
    let temp_dir = TempDir::new().unwrap();
    let ctx = fixed_context(temp_dir.path());
    let schema = schema();
    let ingestion = DataIngestionArtifact {
        train_file_path: temp_dir.path().join("train.csv"),
        test_file_path: temp_dir.path().join("test.csv"),
    };
    let validation = DataValidationArtifact {
        validation_status: true,
        message: String::new(),
    };
    let (features, target) =
        DataTransformation::new(ingestion, validation, DataTransformationConfig::new(&ctx), &schema)
            .split_features_and_target(&visa_frame())
            .unwrap();
    let (_, matrix) = Preprocessor::from_schema(&schema, UnknownCategory::Error)
        .fit_transform(&features)
        .unwrap();
    (matrix, target)
}

#[test]
fn test_fixture_is_balanced_after_resampling() {
    let (x, y) = preprocessed_fixture();
    let (out, labels, report) = SmoteEnn::default().fit_resample(&x, &y).unwrap();

    assert_eq!(report.before.get(&0), Some(&6));
    assert_eq!(report.before.get(&1), Some(&4));
    assert_eq!(report.synthetic, 2);
    assert_eq!(report.removed, 0);
    assert_eq!(out.nrows(), 12);
    assert_eq!(out.ncols(), 13);
    assert_eq!(labels.iter().filter(|&&l| l == 1).count(), 6);
}

#[test]
fn test_original_rows_come_first_unchanged() {
    let (x, y) = preprocessed_fixture();
    let (out, labels, _) = SmoteEnn::default().fit_resample(&x, &y).unwrap();

    assert_eq!(&labels[..10], &y[..]);
    for i in 0..x.nrows() {
        for j in 0..x.ncols() {
            assert_eq!(out[(i, j)], x[(i, j)]);
        }
    }
}

#[test]
fn test_only_smallest_class_is_oversampled() {
    let x = column_matrix(&[
        0.0, 0.1, 0.2, 0.3, 0.4, // class 0
        5.0, 5.1, 5.2, 5.3, // class 1
        10.0, 10.2, // class 2
    ]);
    let y = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2];
    let (out, labels, report) = SmoteEnn::new(5, 3, 11).fit_resample(&x, &y).unwrap();

    assert_eq!(report.synthetic, 3);
    assert_eq!(report.after_oversampling.get(&1), Some(&4));
    assert_eq!(report.after_oversampling.get(&2), Some(&5));
    assert_eq!(report.removed, 0);
    for i in 11..out.nrows() {
        assert_eq!(labels[i], 2);
        assert!(out[(i, 0)] >= 10.0 && out[(i, 0)] <= 10.2);
    }
}

#[test]
fn test_seed_controls_synthetic_rows() {
    let (x, y) = preprocessed_fixture();
    let (a, _, _) = SmoteEnn::new(5, 3, 1).fit_resample(&x, &y).unwrap();
    let (b, _, _) = SmoteEnn::new(5, 3, 1).fit_resample(&x, &y).unwrap();
    let (c, _, _) = SmoteEnn::new(5, 3, 2).fit_resample(&x, &y).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_neighbour_ties_go_to_lower_index() {
    let rows = vec![vec![0.0], vec![1.0], vec![-1.0], vec![3.0]];
    let neighbours = nearest_neighbours(&rows, 2);
    assert_eq!(neighbours[0], vec![1, 2]);
    assert_eq!(neighbours[3], vec![1, 0]);
}

#[test]
fn test_zero_neighbours_rejected() {
    let (x, y) = preprocessed_fixture();
    let err = SmoteEnn::new(0, 3, 42).fit_resample(&x, &y).unwrap_err();
    assert_eq!(err, ResampleError::InvalidNeighbors);
}
