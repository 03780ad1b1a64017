//! engine::state
//!
//! Persisted state of the generation task.
//!
//! The state file records the fingerprint of the last executed run so the
//! next build can tell whether anything changed. It lives at
//! `<base>/target/gitstamp/task-state.json` and is replaced atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::StampPaths;
use crate::core::types::Fingerprint;

/// Current state file schema version.
pub const STATE_VERSION: u32 = 1;

/// Errors from task state operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// I/O error reading or writing the state file.
    #[error("task state i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("task state json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the last executed run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub version: u32,
    pub fingerprint: Fingerprint,
    pub output_file: PathBuf,
}

impl TaskState {
    /// State for a run with the given fingerprint.
    pub fn new(fingerprint: Fingerprint, output_file: impl Into<PathBuf>) -> Self {
        Self {
            version: STATE_VERSION,
            fingerprint,
            output_file: output_file.into(),
        }
    }

    /// Path to the state file.
    pub fn path(paths: &StampPaths) -> PathBuf {
        paths.task_state_path()
    }

    /// Read the state, if any.
    ///
    /// A file from another schema version or one that no longer parses is
    /// treated as absent; the task simply runs again.
    pub fn read(paths: &StampPaths) -> Result<Option<Self>, StateError> {
        let path = Self::path(paths);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| StateError::Io {
            path: path.clone(),
            source,
        })?;

        match serde_json::from_str::<TaskState>(&content) {
            Ok(state) if state.version == STATE_VERSION => Ok(Some(state)),
            Ok(state) => {
                tracing::debug!(version = state.version, "Ignoring task state from another version");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable task state at {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Write the state atomically.
    pub fn write(&self, paths: &StampPaths) -> Result<(), StateError> {
        let path = Self::path(paths);
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(&path, content.as_bytes())
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StateError> {
    let io_err = |p: &Path| {
        let p = p.to_path_buf();
        move |source| StateError::Io { path: p, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).map_err(io_err(&temp_path))?;
    file.write_all(content).map_err(io_err(&temp_path))?;
    file.sync_all().map_err(io_err(&temp_path))?;
    fs::rename(&temp_path, path).map_err(io_err(path))?;
    Ok(())
}
