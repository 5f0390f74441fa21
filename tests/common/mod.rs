//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use serde_json::{json, Value};
use visaprep::pipeline::store::documents_to_frame;
use visaprep::pipeline::{Document, MemoryStore, RunContext, Schema};

pub const SCHEMA_YAML: &str = include_str!("../../config/schema.yaml");
pub const DATABASE: &str = "us_visa";
pub const COLLECTION: &str = "visa_data";

pub fn schema() -> Schema {
    Schema::from_yaml_str(SCHEMA_YAML).unwrap()
}

/// Write the bundled schema into `dir` and return its path
pub fn write_schema(dir: &Path) -> PathBuf {
    let path = dir.join("schema.yaml");
    std::fs::write(&path, SCHEMA_YAML).unwrap();
    path
}

/// Run context pinned to 2026-03-07 09:05:01 under `root`
pub fn fixed_context(root: &Path) -> RunContext {
    let started = NaiveDate::from_ymd_opt(2026, 3, 7)
        .and_then(|d| d.and_hms_opt(9, 5, 1))
        .unwrap();
    RunContext::started_at(root, started)
}

fn to_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be a JSON object"),
    }
}

/// Ten case records: six certified, four denied
///
/// The two classes differ on every feature, so after preprocessing each
/// class forms its own tight cluster.
pub fn visa_documents() -> Vec<Document> {
    let certified = (0..6).map(|i| {
        json!({
            "_id": format!("c{}", i),
            "case_id": format!("EZYV{:02}", i),
            "continent": "Asia",
            "education_of_employee": "Master's",
            "has_job_experience": "Y",
            "requires_job_training": "N",
            "no_of_employees": 5000 + i * 10,
            "yr_of_estab": 1990 + i,
            "region_of_employment": "West",
            "prevailing_wage": 100000.0 + i as f64 * 500.0,
            "unit_of_wage": "Year",
            "full_time_position": "Y",
            "case_status": "Certified",
        })
    });
    let denied = (0..4).map(|j| {
        json!({
            "_id": format!("d{}", j),
            "case_id": format!("EZYV{:02}", 6 + j),
            "continent": "Europe",
            "education_of_employee": "High School",
            "has_job_experience": "N",
            "requires_job_training": "Y",
            "no_of_employees": 20 + j * 5,
            "yr_of_estab": 2016 + j,
            "region_of_employment": "South",
            "prevailing_wage": 1000.0 + j as f64 * 150.0,
            "unit_of_wage": "Hour",
            "full_time_position": "N",
            "case_status": "Denied",
        })
    });
    certified.chain(denied).map(to_document).collect()
}

pub fn visa_frame() -> DataFrame {
    documents_to_frame(&visa_documents()).unwrap()
}

pub fn memory_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert(DATABASE, COLLECTION, visa_documents());
    store
}

/// Lay out a directory-backed store holding the fixture collection
pub fn write_json_store(root: &Path) -> PathBuf {
    let db_dir = root.join(DATABASE);
    std::fs::create_dir_all(&db_dir).unwrap();
    let docs: Vec<Value> = visa_documents().into_iter().map(Value::Object).collect();
    std::fs::write(
        db_dir.join(format!("{}.json", COLLECTION)),
        serde_json::to_string_pretty(&docs).unwrap(),
    )
    .unwrap();
    root.to_path_buf()
}

/// Write `df` as a headed CSV at `path`
pub fn write_csv(df: &mut DataFrame, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
