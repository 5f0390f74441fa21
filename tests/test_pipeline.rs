//! End-to-end tests for the training pipeline

use tempfile::TempDir;
use visaprep::pipeline::*;
use visaprep::utils::npy::load_numpy_array;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn run_fixture(root: &std::path::Path, settings: PipelineSettings) -> Result<PipelineOutcome> {
    let store = memory_store();
    let pipeline = TrainingPipeline::with_schema(fixed_context(root), settings, schema(), &store);
    pipeline.run_pipeline()
}

#[test]
fn test_full_pipeline_writes_every_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_fixture(temp_dir.path(), PipelineSettings::default()).unwrap();
    let run_dir = temp_dir.path().join("03_07_2026_09_05_01");

    assert!(outcome.validation.validation_status);
    assert!(outcome.validation.message.is_empty());

    assert!(run_dir.join("data_ingestion/feature_store/usvisa.csv").is_file());
    assert!(run_dir.join("data_ingestion/ingested/train.csv").is_file());
    assert!(run_dir.join("data_ingestion/ingested/test.csv").is_file());
    assert!(run_dir.join("data_validation/report.yaml").is_file());
    assert!(run_dir
        .join("data_transformation/transformed_object/preprocessing.json")
        .is_file());
    assert_eq!(outcome.report_path, Some(run_dir.join("run_report.json")));
    assert!(run_dir.join("run_report.json").is_file());

    let train = load_numpy_array(&outcome.transformation.transformed_train_file_path).unwrap();
    let test = load_numpy_array(&outcome.transformation.transformed_test_file_path).unwrap();

    // Resampling only ever grows the 8 training rows here; test keeps its 2.
    assert!(train.nrows() >= 8);
    assert_eq!(train.ncols(), 14);
    assert_eq!(test.nrows(), 2);
    assert_eq!(test.ncols(), 14);

    let train_labels: Vec<f64> = (0..train.nrows()).map(|i| train[(i, 13)]).collect();
    let certified = train_labels.iter().filter(|&&v| v == 0.0).count();
    let denied = train_labels.iter().filter(|&&v| v == 1.0).count();
    assert_eq!(certified + denied, train.nrows());
    assert_eq!(certified, denied);

    for i in 0..test.nrows() {
        assert!(test[(i, 13)] == 0.0 || test[(i, 13)] == 1.0);
    }
}

#[test]
fn test_stratified_run_holds_out_one_row_per_class() {
    let temp_dir = TempDir::new().unwrap();
    let settings = PipelineSettings {
        stratify: true,
        ..PipelineSettings::default()
    };
    let outcome = run_fixture(temp_dir.path(), settings).unwrap();

    let train = load_numpy_array(&outcome.transformation.transformed_train_file_path).unwrap();
    let test = load_numpy_array(&outcome.transformation.transformed_test_file_path).unwrap();

    // 5 certified and 3 denied rows in train; SMOTE adds 2 denied.
    assert_eq!(train.nrows(), 10);
    assert_eq!(outcome.stats.resample.before.get(&1), Some(&3));
    assert_eq!(outcome.stats.resample.synthetic, 2);

    let mut test_labels: Vec<f64> = (0..test.nrows()).map(|i| test[(i, 13)]).collect();
    test_labels.sort_by(f64::total_cmp);
    assert_eq!(test_labels, vec![0.0, 1.0]);
}

#[test]
fn test_stats_describe_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_fixture(temp_dir.path(), PipelineSettings::default()).unwrap();
    let stats = &outcome.stats;

    assert_eq!(stats.train_rows_in, 8);
    assert_eq!(stats.test_rows, 2);
    assert_eq!(stats.n_features(), 13);
    assert_eq!(stats.resample.before.values().sum::<usize>(), 8);
    assert_eq!(
        stats.train_rows_out,
        stats.train_rows_in + stats.resample.synthetic - stats.resample.removed
    );
}

#[test]
fn test_run_report_records_settings_and_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let outcome = run_fixture(temp_dir.path(), PipelineSettings::default()).unwrap();
    let report_path = outcome.report_path.unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["metadata"]["run"], "03_07_2026_09_05_01");
    assert_eq!(report["metadata"]["reference_year"], 2026);
    assert_eq!(report["settings"]["test_size"], 0.2);
    assert_eq!(report["validation"]["validation_status"], true);
    assert_eq!(report["stats"]["train_rows_out"], outcome.stats.train_rows_out);
}

#[test]
fn test_report_can_be_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let settings = PipelineSettings {
        write_report: false,
        ..PipelineSettings::default()
    };
    let outcome = run_fixture(temp_dir.path(), settings).unwrap();
    assert!(outcome.report_path.is_none());
    assert!(!temp_dir.path().join("03_07_2026_09_05_01/run_report.json").exists());
}

#[test]
fn test_same_settings_give_same_arrays() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = run_fixture(first.path(), PipelineSettings::default()).unwrap();
    let b = run_fixture(second.path(), PipelineSettings::default()).unwrap();

    let train_a = std::fs::read(&a.transformation.transformed_train_file_path).unwrap();
    let train_b = std::fs::read(&b.transformation.transformed_train_file_path).unwrap();
    assert_eq!(train_a, train_b);

    let object_a = std::fs::read_to_string(&a.transformation.transformed_object_file_path).unwrap();
    let object_b = std::fs::read_to_string(&b.transformation.transformed_object_file_path).unwrap();
    assert_eq!(object_a, object_b);
}

#[test]
fn test_missing_collection_fails_in_ingestion() {
    let temp_dir = TempDir::new().unwrap();
    let settings = PipelineSettings {
        collection: "absent".to_string(),
        ..PipelineSettings::default()
    };
    let err = run_fixture(temp_dir.path(), settings).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Ingestion));
    assert!(matches!(err.root(), PipelineError::DataAccess { .. }));
    assert!(!temp_dir.path().join("03_07_2026_09_05_01/data_validation").exists());
}

#[test]
fn test_pipeline_loads_schema_from_settings() {
    let temp_dir = TempDir::new().unwrap();
    let schema_path = write_schema(temp_dir.path());
    let store = memory_store();
    let settings = PipelineSettings {
        schema_path,
        ..PipelineSettings::default()
    };

    let pipeline =
        TrainingPipeline::new(fixed_context(&temp_dir.path().join("artifact")), settings, &store)
            .unwrap();
    assert_eq!(pipeline.schema().target_column(), "case_status");
    assert!(pipeline.run_pipeline().is_ok());
}

#[test]
fn test_missing_schema_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = memory_store();
    let settings = PipelineSettings {
        schema_path: temp_dir.path().join("nope.yaml"),
        ..PipelineSettings::default()
    };
    let result = TrainingPipeline::new(fixed_context(temp_dir.path()), settings, &store);
    assert!(matches!(result, Err(PipelineError::Schema(_))));
}
