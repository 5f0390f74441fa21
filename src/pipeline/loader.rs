//! CSV readers and writers for the feature store and split files

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Load a CSV table that has a header row.
///
/// Types are inferred from the whole file so a column that is empty in its
/// first rows is not mistyped.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| PipelineError::table(path, e))
}

/// Write `df` as CSV, creating parent directories as needed.
pub fn write_table(df: &mut DataFrame, path: &Path, include_header: bool) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(include_header)
        .finish(df)
        .map_err(|e| PipelineError::table(path, e))
}

/// Create the parent directory of `path` if it does not exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Names of the columns of `df`, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}
