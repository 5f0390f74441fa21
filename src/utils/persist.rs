//! JSON and YAML persistence for fitted objects and reports

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pipeline::error::{PipelineError, Result};
use crate::pipeline::loader::ensure_parent_dir;

/// Serialize `value` as pretty-printed JSON at `path`.
pub fn save_object<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| PipelineError::serialization(path, e))?;
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    tracing::debug!(path = %path.display(), "saved object");
    Ok(())
}

/// Load a value previously written by [`save_object`].
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::serialization(path, e))
}

/// Serialize `value` as YAML at `path`.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_yaml::to_writer(&mut writer, value).map_err(|e| PipelineError::serialization(path, e))?;
    writer.flush().map_err(|e| PipelineError::io(path, e))
}
