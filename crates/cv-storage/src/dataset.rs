use parking_lot::RwLock;

use cv_core::{DatasetRow, Result};

/// Ordered collection of labeled rows backing training.
pub trait DatasetStore: Send + Sync {
    /// Every row, in insertion order.
    fn read_all(&self) -> Result<Vec<DatasetRow>>;
    /// Replace the whole dataset in one step.
    fn rewrite(&self, rows: &[DatasetRow]) -> Result<()>;
    /// Append rows and return the new dataset size.
    fn append(&self, rows: &[DatasetRow]) -> Result<usize> {
        let mut all = self.read_all()?;
        all.extend_from_slice(rows);
        self.rewrite(&all)?;
        Ok(all.len())
    }
    fn len(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// In-memory dataset for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryDatasetStore {
    rows: RwLock<Vec<DatasetRow>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<DatasetRow>) -> Self {
        Self { rows: RwLock::new(rows) }
    }
}

impl DatasetStore for MemoryDatasetStore {
    fn read_all(&self) -> Result<Vec<DatasetRow>> {
        Ok(self.rows.read().clone())
    }

    fn rewrite(&self, rows: &[DatasetRow]) -> Result<()> {
        *self.rows.write() = rows.to_vec();
        Ok(())
    }

    fn append(&self, rows: &[DatasetRow]) -> Result<usize> {
        let mut guard = self.rows.write();
        guard.extend_from_slice(rows);
        Ok(guard.len())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.rows.read().len())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
