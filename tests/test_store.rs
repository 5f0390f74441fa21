//! Tests for document stores and collection export

use polars::prelude::*;
use tempfile::TempDir;
use visaprep::pipeline::{CollectionExporter, DocumentStore, JsonDocumentStore, MemoryStore, PipelineError};

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_export_drops_id_and_keeps_field_order() {
    let store = memory_store();
    let exporter = CollectionExporter::new(&store, DATABASE);
    let df = exporter.export_collection(COLLECTION).unwrap();

    assert_shape(&df, 10, 12);
    assert_missing_columns(&df, &["_id"]);
    assert_eq!(df.get_column_names()[0].as_str(), "case_id");
    assert_eq!(df.column("no_of_employees").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("prevailing_wage").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_na_sentinel_becomes_null_in_every_column() {
    let mut docs = visa_documents();
    docs[0].insert("continent".to_string(), serde_json::json!("na"));
    docs[1].insert("no_of_employees".to_string(), serde_json::json!("na"));
    let mut store = MemoryStore::new();
    store.insert(DATABASE, COLLECTION, docs);

    let df = CollectionExporter::new(&store, DATABASE)
        .export_collection(COLLECTION)
        .unwrap();
    assert_eq!(df.column("continent").unwrap().null_count(), 1);
    let employees = df.column("no_of_employees").unwrap();
    assert_eq!(employees.null_count(), 1);
    assert_eq!(employees.dtype(), &DataType::Int64);
}

#[test]
fn test_empty_collection_is_data_access_error() {
    let mut store = MemoryStore::new();
    store.insert(DATABASE, COLLECTION, Vec::new());
    let err = CollectionExporter::new(&store, DATABASE)
        .export_collection(COLLECTION)
        .unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess { .. }));
}

#[test]
fn test_json_store_reads_array_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = write_json_store(temp_dir.path());
    let store = JsonDocumentStore::connect(&root).unwrap();

    let docs = store.find_all(DATABASE, COLLECTION).unwrap();
    assert_eq!(docs.len(), 10);
}

#[test]
fn test_json_store_reads_lines_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_dir = temp_dir.path().join(DATABASE);
    std::fs::create_dir_all(&db_dir).unwrap();
    let lines: Vec<String> = visa_documents()
        .into_iter()
        .map(|d| serde_json::Value::Object(d).to_string())
        .collect();
    std::fs::write(db_dir.join("visa_data.jsonl"), lines.join("\n")).unwrap();

    let store = JsonDocumentStore::connect(temp_dir.path()).unwrap();
    let df = CollectionExporter::new(&store, DATABASE)
        .export_collection(COLLECTION)
        .unwrap();
    assert_shape(&df, 10, 12);
}

#[test]
fn test_missing_root_is_connectivity_error() {
    let err = JsonDocumentStore::connect("definitely/not/a/store").unwrap_err();
    assert!(matches!(err, PipelineError::Connectivity { .. }));
}

#[test]
fn test_missing_collection_is_data_access_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonDocumentStore::connect(temp_dir.path()).unwrap();
    let err = store.find_all(DATABASE, "nothing_here").unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess { .. }));
}

#[test]
fn test_malformed_collection_is_data_access_error() {
    let temp_dir = TempDir::new().unwrap();
    let db_dir = temp_dir.path().join(DATABASE);
    std::fs::create_dir_all(&db_dir).unwrap();
    std::fs::write(db_dir.join("visa_data.json"), r#"{"not": "an array"}"#).unwrap();

    let store = JsonDocumentStore::connect(temp_dir.path()).unwrap();
    let err = store.find_all(DATABASE, COLLECTION).unwrap_err();
    assert!(matches!(err, PipelineError::DataAccess { .. }));
}
