use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use cv_core::{Result, TriageError};

/// Replace `path` with `bytes` so readers see either the old or the new
/// content, never a prefix. The temp file lives next to the target so the
/// final rename stays on one filesystem.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        TriageError::Storage(format!("failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
