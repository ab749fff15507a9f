//! # Checkpoint Stores
//!
//! The JSON file store writes `{"file_number": N, "byte_offset": M}` to a
//! temporary sibling and renames it over the target, so a crash leaves either
//! the old cursor or the new one.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use shared_types::ScanCheckpoint;

use crate::domain::errors::ScanError;
use crate::ports::outbound::CheckpointStore;

/// Checkpoint persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileCheckpointStore {
    path: PathBuf,
}

impl JsonFileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for JsonFileCheckpointStore {
    fn load(&self) -> Result<ScanCheckpoint, ScanError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ScanCheckpoint::default())
            }
            Err(e) => {
                return Err(ScanError::Checkpoint(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&raw).map_err(|e| {
            ScanError::Checkpoint(format!("parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, checkpoint: &ScanCheckpoint) -> Result<(), ScanError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let body = serde_json::to_vec_pretty(checkpoint)?;
            let tmp = self.temp_path();
            std::fs::write(&tmp, body)?;
            std::fs::rename(&tmp, &self.path)
        };
        write().map_err(|e| ScanError::Checkpoint(format!("write {}: {}", self.path.display(), e)))
    }
}

/// Checkpoint held in memory. Counts saves so tests can assert on them.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    inner: Mutex<(ScanCheckpoint, usize)>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint(checkpoint: ScanCheckpoint) -> Self {
        Self {
            inner: Mutex::new((checkpoint, 0)),
        }
    }

    pub fn current(&self) -> ScanCheckpoint {
        self.inner.lock().0
    }

    /// Number of `save` calls so far.
    pub fn saves(&self) -> usize {
        self.inner.lock().1
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn load(&self) -> Result<ScanCheckpoint, ScanError> {
        Ok(self.current())
    }

    fn save(&self, checkpoint: &ScanCheckpoint) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        inner.0 = *checkpoint;
        inner.1 += 1;
        Ok(())
    }
}
