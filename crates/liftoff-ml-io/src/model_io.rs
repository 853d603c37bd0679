use crate::error::{DataError, DataResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Content written to a temporary file next to its destination, waiting to
/// be renamed into place by [`StagedFile::commit`]. Dropping it uncommitted
/// removes the temporary and leaves the destination as it was.
#[derive(Debug)]
pub struct StagedFile {
    tmp: NamedTempFile,
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the staged content over the destination.
    pub fn commit(self) -> DataResult<()> {
        let path = self.path;
        self.tmp.persist(&path).map_err(|e| DataError::Persistence {
            path: path.clone(),
            reason: e.error.to_string(),
        })?;
        debug!(path = %path.display(), "committed file");
        Ok(())
    }
}

/// Write `bytes` to a flushed temporary file in the destination directory.
///
/// Parent directories are created. A destination that is a directory is
/// rejected here, before anything is renamed.
pub fn stage_file(path: &Path, bytes: &[u8]) -> DataResult<StagedFile> {
    let fail = |reason: String| DataError::Persistence {
        path: path.to_path_buf(),
        reason,
    };

    if path.is_dir() {
        return Err(fail("destination is a directory".into()));
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| fail(format!("cannot create {}: {e}", dir.display())))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
    tmp.write_all(bytes).map_err(|e| fail(e.to_string()))?;
    tmp.as_file().sync_all().map_err(|e| fail(e.to_string()))?;

    debug!(path = %path.display(), bytes = bytes.len(), "staged file");
    Ok(StagedFile {
        tmp,
        path: path.to_path_buf(),
    })
}

/// Stage `value` as pretty JSON.
pub fn stage_json<T: Serialize>(value: &T, path: &Path) -> DataResult<StagedFile> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DataError::Persistence {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    stage_file(path, json.as_bytes())
}

/// Write `bytes` to `path` so readers see either the old file or the new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> DataResult<()> {
    stage_file(path, bytes)?.commit()
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> DataResult<()> {
    stage_json(value, path)?.commit()
}

/// Load a JSON document written by [`save_json`].
pub fn load_json<T: DeserializeOwned>(path: &Path) -> DataResult<T> {
    if !path.is_file() {
        return Err(DataError::MissingInput {
            path: path.to_path_buf(),
            hint: "Train a model first to produce it.".into(),
        });
    }
    let json = fs::read_to_string(path).map_err(|e| DataError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&json).map_err(|e| DataError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
