//! Atomic artifact writing
//!
//! Contents are written to a temporary file next to the destination and
//! renamed over it, so an interrupted run never leaves a truncated header.

use capsule_api::{CapsuleError, CapsuleResult};
use log::debug;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `contents`, creating parent directories first.
pub fn write_atomic(path: &Path, contents: &str) -> CapsuleResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| CapsuleError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CapsuleError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| CapsuleError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| CapsuleError::io(path, e.error))?;

    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Whether `path` already holds exactly `contents`. A missing file is stale.
pub fn is_up_to_date(path: &Path, contents: &str) -> CapsuleResult<bool> {
    match fs::read_to_string(path) {
        Ok(existing) => Ok(existing == contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CapsuleError::io(path, e)),
    }
}
