//! Dataset writer: pretty JSON array, swapped into place atomically.

use std::fs::create_dir_all;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::aggregator::Record;
use crate::error::{PpeError, Result};

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let ser_err = |source: std::io::Error| PpeError::Serialization {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    create_dir_all(dir).map_err(ser_err)?;

    // temp file lives next to the target so persist() is a rename
    let tmp = NamedTempFile::new_in(dir).map_err(ser_err)?;
    let mut out = BufWriter::new(tmp);
    serde_json::to_writer_pretty(&mut out, records).map_err(|e| ser_err(e.into()))?;
    out.flush().map_err(ser_err)?;

    let tmp = out.into_inner().map_err(|e| ser_err(e.into_error()))?;
    tmp.persist(path).map_err(|e| ser_err(e.error))?;
    Ok(())
}
