//! NumPy `.npy` reader and writer for dense `f64` matrices
//!
//! Only the subset the pipeline produces is supported: format version 1.0,
//! little-endian `<f8` data, C (row-major) order, two dimensions.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use faer::Mat;

use crate::pipeline::error::{PipelineError, Result};
use crate::pipeline::loader::ensure_parent_dir;

const MAGIC: &[u8] = b"\x93NUMPY";
const VERSION: [u8; 2] = [1, 0];
/// Magic, version and header-length prefix, in bytes.
const PREAMBLE_LEN: usize = 10;
const ALIGNMENT: usize = 64;

fn header_for(rows: usize, cols: usize) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows, cols
    );
    // Pad with spaces so data starts on an aligned offset; the header ends in '\n'.
    let unpadded = PREAMBLE_LEN + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let mut header = dict.into_bytes();
    header.extend(std::iter::repeat(b' ').take(padding));
    header.push(b'\n');
    header
}

/// Write `array` to `path`, creating parent directories as needed.
pub fn save_numpy_array(path: &Path, array: &Mat<f64>) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let header = header_for(array.nrows(), array.ncols());
    let header_len = u16::try_from(header.len())
        .map_err(|_| PipelineError::serialization(path, "npy header too long"))?;

    let write = |writer: &mut BufWriter<File>| -> std::io::Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION)?;
        writer.write_all(&header_len.to_le_bytes())?;
        writer.write_all(&header)?;
        for i in 0..array.nrows() {
            for j in 0..array.ncols() {
                writer.write_all(&array[(i, j)].to_le_bytes())?;
            }
        }
        writer.flush()
    };
    write(&mut writer).map_err(|e| PipelineError::io(path, e))?;

    tracing::debug!(path = %path.display(), rows = array.nrows(), cols = array.ncols(), "saved array");
    Ok(())
}

/// Read a two-dimensional `<f8` C-order array written by [`save_numpy_array`].
pub fn load_numpy_array(path: &Path) -> Result<Mat<f64>> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut preamble = [0u8; PREAMBLE_LEN];
    reader
        .read_exact(&mut preamble)
        .map_err(|e| PipelineError::io(path, e))?;
    if &preamble[..6] != MAGIC {
        return Err(PipelineError::serialization(path, "not an npy file"));
    }
    if preamble[6] != 1 {
        return Err(PipelineError::serialization(
            path,
            format!("unsupported npy version {}.{}", preamble[6], preamble[7]),
        ));
    }
    let header_len = u16::from_le_bytes([preamble[8], preamble[9]]) as usize;

    let mut header = vec![0u8; header_len];
    reader
        .read_exact(&mut header)
        .map_err(|e| PipelineError::io(path, e))?;
    let header = String::from_utf8_lossy(&header);
    let (rows, cols) = parse_header(&header).map_err(|reason| PipelineError::serialization(path, reason))?;

    let mut data = Vec::with_capacity(rows * cols * 8);
    reader
        .read_to_end(&mut data)
        .map_err(|e| PipelineError::io(path, e))?;
    if data.len() != rows * cols * 8 {
        return Err(PipelineError::serialization(
            path,
            format!("expected {} data bytes, found {}", rows * cols * 8, data.len()),
        ));
    }

    let mut array = Mat::<f64>::zeros(rows, cols);
    for (idx, chunk) in data.chunks_exact(8).enumerate() {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        array[(idx / cols, idx % cols)] = f64::from_le_bytes(bytes);
    }
    Ok(array)
}

/// Extract the shape from a header dict, checking dtype and order.
fn parse_header(header: &str) -> std::result::Result<(usize, usize), String> {
    if !header.contains("'descr': '<f8'") {
        return Err(format!("unsupported dtype in header: {}", header.trim()));
    }
    if !header.contains("'fortran_order': False") {
        return Err("only C-order arrays are supported".to_string());
    }

    let start = header
        .find("'shape': (")
        .map(|i| i + "'shape': (".len())
        .ok_or("header has no shape")?;
    let end = header[start..]
        .find(')')
        .map(|i| start + i)
        .ok_or("unterminated shape")?;

    let dims: Vec<usize> = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|e| format!("bad dimension '{}': {}", s, e)))
        .collect::<std::result::Result<_, _>>()?;

    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        other => Err(format!("expected a 2-d array, found {} dimensions", other.len())),
    }
}
