//! Document-store access and collection export
//!
//! [`DocumentStore`] is the thin query interface the pipeline needs from a
//! store. [`CollectionExporter`] turns a whole collection into a `DataFrame`:
//! columns are the union of document fields in first-seen order, the internal
//! `_id` field is dropped and the `"na"` sentinel becomes null.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde_json::{Map, Value};

use super::error::{PipelineError, Result};

/// Field the store uses for its internal identifier.
pub const ID_FIELD: &str = "_id";

/// String the source data uses to mark a missing value.
pub const MISSING_SENTINEL: &str = "na";

pub type Document = Map<String, Value>;

/// Read access to named collections of JSON documents.
pub trait DocumentStore {
    /// Human-readable location, used in error messages and logs.
    fn location(&self) -> String;

    /// Fetch every document of `collection` in `database`.
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>>;
}

/// Directory-backed store.
///
/// Collections live at `<root>/<database>/<collection>.json` (an array of
/// objects) or `<root>/<database>/<collection>.jsonl` (one object per line).
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    root: PathBuf,
}

impl JsonDocumentStore {
    /// Open the store rooted at `root`. Fails if the root is not a directory.
    pub fn connect(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PipelineError::Connectivity {
                location: root.display().to_string(),
                reason: "store root is not a readable directory".to_string(),
            });
        }
        Ok(Self { root })
    }

    fn collection_path(&self, database: &str, collection: &str) -> Option<PathBuf> {
        let dir = self.root.join(database);
        ["json", "jsonl"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", collection, ext)))
            .find(|p| p.is_file())
    }
}

impl DocumentStore for JsonDocumentStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(PipelineError::Connectivity {
                location: self.location(),
                reason: "store root disappeared".to_string(),
            });
        }

        let path = self
            .collection_path(database, collection)
            .ok_or_else(|| PipelineError::DataAccess {
                collection: collection.to_string(),
                reason: format!("no such collection in database '{}'", database),
            })?;

        let malformed = |reason: String| PipelineError::DataAccess {
            collection: collection.to_string(),
            reason,
        };

        let values: Vec<Value> = if path.extension().is_some_and(|e| e == "jsonl") {
            read_json_lines(&path).map_err(|e| malformed(e))?
        } else {
            let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
            let value: Value = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| malformed(format!("{}: {}", path.display(), e)))?;
            match value {
                Value::Array(values) => values,
                _ => return Err(malformed("expected a JSON array of documents".to_string())),
            }
        };

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(doc) => Ok(doc),
                other => Err(malformed(format!(
                    "document {} is not an object: {}",
                    i, other
                ))),
            })
            .collect()
    }
}

fn read_json_lines(path: &Path) -> std::result::Result<Vec<Value>, String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut values = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("{}: {}", path.display(), e))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .map_err(|e| format!("{} line {}: {}", path.display(), line_no + 1, e))?;
        values.push(value);
    }
    Ok(values)
}

/// In-process store, keyed by database and collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<(String, String), Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a collection.
    pub fn insert(&mut self, database: &str, collection: &str, documents: Vec<Document>) {
        self.collections
            .insert((database.to_string(), collection.to_string()), documents);
    }
}

impl DocumentStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.collections
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .ok_or_else(|| PipelineError::DataAccess {
                collection: collection.to_string(),
                reason: format!("no such collection in database '{}'", database),
            })
    }
}

/// Exports whole collections of one database as data frames.
pub struct CollectionExporter<'a> {
    store: &'a dyn DocumentStore,
    database: String,
}

impl<'a> CollectionExporter<'a> {
    pub fn new(store: &'a dyn DocumentStore, database: impl Into<String>) -> Self {
        Self {
            store,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Fetch `collection` and materialize it as a frame.
    pub fn export_collection(&self, collection: &str) -> Result<DataFrame> {
        tracing::info!(
            store = %self.store.location(),
            database = %self.database,
            collection,
            "exporting collection"
        );
        let documents = self.store.find_all(&self.database, collection)?;
        if documents.is_empty() {
            return Err(PipelineError::DataAccess {
                collection: collection.to_string(),
                reason: "collection contains no documents".to_string(),
            });
        }

        let df = documents_to_frame(&documents).map_err(|e| PipelineError::DataAccess {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(rows = df.height(), columns = df.width(), "exported collection");
        Ok(df)
    }
}

/// Build a frame from documents.
///
/// Columns are the union of fields in first-seen order, minus [`ID_FIELD`].
/// JSON null, absent fields and [`MISSING_SENTINEL`] strings all become null.
pub fn documents_to_frame(documents: &[Document]) -> PolarsResult<DataFrame> {
    let mut field_names: Vec<&str> = Vec::new();
    for doc in documents {
        for key in doc.keys() {
            if key != ID_FIELD && !field_names.contains(&key.as_str()) {
                field_names.push(key.as_str());
            }
        }
    }

    let columns: Vec<Column> = field_names
        .iter()
        .map(|name| {
            let values: Vec<Option<&Value>> = documents
                .iter()
                .map(|doc| doc.get(*name).filter(|v| !is_missing(v)))
                .collect();
            build_column(name, &values)
        })
        .collect();

    DataFrame::new(columns)
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s == MISSING_SENTINEL,
        _ => false,
    }
}

/// Pick the narrowest column type that holds every non-null value.
fn build_column(name: &str, values: &[Option<&Value>]) -> Column {
    let present = || values.iter().flatten();

    if present().all(|v| v.is_boolean()) && present().next().is_some() {
        let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        return Column::new(name.into(), data);
    }
    if present().all(|v| v.is_i64()) && present().next().is_some() {
        let data: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        return Column::new(name.into(), data);
    }
    if present().all(|v| v.is_number()) && present().next().is_some() {
        let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        return Column::new(name.into(), data);
    }

    let data: Vec<Option<String>> = values
        .iter()
        .map(|v| {
            v.map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .collect();
    Column::new(name.into(), data)
}
