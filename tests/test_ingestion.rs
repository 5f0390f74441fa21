//! Tests for the ingestion stage

use tempfile::TempDir;
use visaprep::pipeline::{
    read_table, train_test_split, DataIngestion, DataIngestionConfig, PipelineError, SplitStrategy,
};

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_run_writes_feature_store_and_splits() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = fixed_context(temp_dir.path());
    let store = memory_store();
    let ingestion = DataIngestion::new(DataIngestionConfig::new(&ctx), &store, DATABASE);

    let artifact = ingestion.run().unwrap();
    assert!(artifact.train_file_path.ends_with("data_ingestion/ingested/train.csv"));

    let train = read_table(&artifact.train_file_path).unwrap();
    let test = read_table(&artifact.test_file_path).unwrap();
    assert_shape(&train, 8, 12);
    assert_shape(&test, 2, 12);
    assert_has_columns(&train, &["case_id", "case_status", "yr_of_estab"]);
}

#[test]
fn test_feature_store_has_no_header() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = fixed_context(temp_dir.path());
    let store = memory_store();
    let config = DataIngestionConfig::new(&ctx);
    let feature_store = config.feature_store_file_path.clone();

    DataIngestion::new(config, &store, DATABASE)
        .export_to_feature_store()
        .unwrap();

    let content = std::fs::read_to_string(&feature_store).unwrap();
    assert_eq!(content.lines().count(), 10);
    assert!(content.lines().next().unwrap().starts_with("EZYV00,Asia"));
    assert!(!content.contains("case_status"));
}

#[test]
fn test_same_seed_gives_byte_identical_splits() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let store = memory_store();

    let a = DataIngestion::new(DataIngestionConfig::new(&fixed_context(first.path())), &store, DATABASE)
        .run()
        .unwrap();
    let b = DataIngestion::new(DataIngestionConfig::new(&fixed_context(second.path())), &store, DATABASE)
        .run()
        .unwrap();

    assert_eq!(
        std::fs::read(&a.train_file_path).unwrap(),
        std::fs::read(&b.train_file_path).unwrap()
    );
    assert_eq!(
        std::fs::read(&a.test_file_path).unwrap(),
        std::fs::read(&b.test_file_path).unwrap()
    );
}

#[test]
fn test_split_is_a_partition() {
    let df = visa_frame();
    let (train, test) = train_test_split(&df, 0.2, 42, &SplitStrategy::Shuffle).unwrap();

    let mut ids: Vec<String> = train
        .column("case_id")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .chain(test.column("case_id").unwrap().str().unwrap().into_iter())
        .flatten()
        .map(str::to_string)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[test]
fn test_stratified_split_keeps_both_classes_in_test() {
    let df = visa_frame();
    let strategy = SplitStrategy::Stratified {
        column: "case_status".to_string(),
    };
    for seed in [1, 2, 3, 42] {
        let (train, test) = train_test_split(&df, 0.2, seed, &strategy).unwrap();
        let statuses: Vec<&str> = test
            .column("case_status")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert!(statuses.contains(&"Certified"));
        assert!(statuses.contains(&"Denied"));
        assert_eq!(train.height(), 8);
    }
}

#[test]
fn test_unknown_collection_fails_ingestion() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = fixed_context(temp_dir.path());
    let store = memory_store();
    let mut config = DataIngestionConfig::new(&ctx);
    config.collection_name = "no_such_collection".to_string();

    let err = DataIngestion::new(config, &store, DATABASE).run().unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess { .. }));
    assert!(!ctx.artifact_dir.exists());
}
