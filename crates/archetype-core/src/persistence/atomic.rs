//! Atomic JSON documents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ArchetypeError, ArchetypeResult};

/// Temporary sibling used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `value` as pretty JSON and replace `path` atomically.
///
/// The document is written to a temporary sibling, flushed to disk and
/// renamed over the target, so a reader sees either the old or the new
/// document and never a partial one. Parent directories are created.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> ArchetypeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArchetypeError::io(parent, e))?;
    }

    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);

    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(ArchetypeError::io(&tmp, e));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ArchetypeError::io(path, e));
    }

    tracing::trace!(path = %path.display(), bytes = bytes.len(), "PERSISTENCE: wrote snapshot");
    Ok(())
}

/// Read a JSON document.
///
/// Returns `Ok(None)` when the file does not exist and
/// [`ArchetypeError::CorruptSnapshot`] when it cannot be parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> ArchetypeResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ArchetypeError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ArchetypeError::corrupt(path, e.to_string()))
}

/// Read a JSON document, degrading any failure to `None` with a warning.
///
/// `label` prefixes the log line.
pub fn read_json_or_warn<T: DeserializeOwned>(label: &str, path: &Path) -> Option<T> {
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "{}: unreadable snapshot, starting empty",
                label
            );
            None
        }
    }
}
