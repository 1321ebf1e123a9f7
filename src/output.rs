//! Writing GeoJSON documents to disk.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{BoundaryError, Result};

/// Serialize `value` as one JSON document at `path`, creating parent
/// directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let write_err = |source| BoundaryError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| BoundaryError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(write_err)?;

    Ok(())
}
