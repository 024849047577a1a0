use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use cv_classifier::TrainedSnapshot;
use cv_core::{Result, TriageError};

use crate::atomic::write_atomic;

/// Single-file JSON artifact holding model and encoder together, so the two
/// can not be loaded from different fits.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no artifact exists yet. A corrupt or inconsistent
    /// artifact is a storage error.
    pub fn load(&self) -> Result<Option<TrainedSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot artifact");
                return Ok(None);
            }
            Err(e) => {
                return Err(TriageError::Storage(format!("read {}: {e}", self.path.display())))
            }
        };
        let snapshot: TrainedSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
            TriageError::Storage(format!("corrupt snapshot {}: {e}", self.path.display()))
        })?;
        snapshot.validate()?;
        info!(snapshot = %snapshot.id, rows = snapshot.rows, "snapshot loaded");
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &TrainedSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        write_atomic(&self.path, &bytes)?;
        debug!(snapshot = %snapshot.id, path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}
