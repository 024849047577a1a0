use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use cv_core::{DatasetRow, Result, TriageError};

use crate::atomic::write_atomic;
use crate::dataset::DatasetStore;

/// One JSON object per line. A missing file is an empty dataset; blank lines
/// are skipped. Every write replaces the file atomically.
pub struct JsonlDatasetStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonlDatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> Result<Vec<DatasetRow>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TriageError::Storage(format!("read {}: {e}", self.path.display())))
            }
        };
        parse_lines(&text)
    }

    fn store(&self, rows: &[DatasetRow]) -> Result<()> {
        let mut buf = Vec::with_capacity(rows.len() * 256);
        for row in rows {
            serde_json::to_writer(&mut buf, row)?;
            buf.push(b'\n');
        }
        write_atomic(&self.path, &buf)?;
        debug!(path = %self.path.display(), rows = rows.len(), "dataset written");
        Ok(())
    }
}

/// Parse JSONL text; the error names the offending row (0-based, blank lines
/// not counted).
pub(crate) fn parse_lines(text: &str) -> Result<Vec<DatasetRow>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str::<DatasetRow>(line)
                .map_err(|e| TriageError::schema(e.to_string()).at_row(i))
        })
        .collect()
}

impl DatasetStore for JsonlDatasetStore {
    fn read_all(&self) -> Result<Vec<DatasetRow>> {
        let _guard = self.lock.lock();
        self.load()
    }

    fn rewrite(&self, rows: &[DatasetRow]) -> Result<()> {
        let _guard = self.lock.lock();
        self.store(rows)
    }

    fn append(&self, rows: &[DatasetRow]) -> Result<usize> {
        let _guard = self.lock.lock();
        let mut all = self.load()?;
        all.extend_from_slice(rows);
        self.store(&all)?;
        Ok(all.len())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
