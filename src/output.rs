//! Atomic output file writing.
//!
//! Build artifacts are written to a temporary file next to their final
//! location and renamed into place, so a failed build never leaves a
//! truncated package or sprite sheet behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutputError {
    /// IO error while creating or writing the temporary file
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The temporary file could not be moved into place
    #[error("Failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write `contents` to `path` atomically.
///
/// Parent directories are created as needed. The previous file, if any,
/// stays untouched unless the whole write succeeds.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    let io_err = |source| OutputError::Io { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
    temp.write_all(contents).map_err(io_err)?;
    temp.flush().map_err(io_err)?;

    temp.persist(path)
        .map_err(|e| OutputError::Persist { path: path.to_path_buf(), source: e.error })?;
    Ok(())
}
