//! Holder for the currently active snapshot.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use cv_core::{Result, TriageError};

use crate::snapshot::TrainedSnapshot;

/// Shared classifier state. Readers clone the `Arc` under a short read lock
/// and then work on that snapshot alone; writers swap the whole `Arc`.
#[derive(Debug, Default)]
pub struct ClassifierState {
    current: RwLock<Option<Arc<TrainedSnapshot>>>,
}

impl ClassifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: TrainedSnapshot) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(snapshot))),
        }
    }

    pub fn current(&self) -> Option<Arc<TrainedSnapshot>> {
        self.current.read().clone()
    }

    pub fn require(&self) -> Result<Arc<TrainedSnapshot>> {
        self.current().ok_or(TriageError::NotTrained)
    }

    pub fn is_trained(&self) -> bool {
        self.current.read().is_some()
    }

    /// Install a new snapshot, returning the one it replaced.
    pub fn install(&self, snapshot: TrainedSnapshot) -> Option<Arc<TrainedSnapshot>> {
        self.install_shared(Arc::new(snapshot))
    }

    pub fn install_shared(&self, next: Arc<TrainedSnapshot>) -> Option<Arc<TrainedSnapshot>> {
        info!(snapshot = %next.id, rows = next.rows, "installing classifier snapshot");
        self.current.write().replace(next)
    }
}
