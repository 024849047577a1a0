use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    /// Extraction backend missing, unreachable or returned garbage.
    /// Recovered inside the extractor; never returned from `extract`.
    #[error("Extraction unavailable: {0}")]
    ExtractionUnavailable(String),
    #[error("Model not trained. Call train() first")]
    NotTrained,
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Schema mismatch{}: {detail}", row_suffix(.row))]
    SchemaMismatch { row: Option<usize>, detail: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {r}")).unwrap_or_default()
}

impl TriageError {
    pub fn schema(detail: impl Into<String>) -> Self {
        Self::SchemaMismatch { row: None, detail: detail.into() }
    }

    /// Attach a dataset row index to a schema error; other variants pass through.
    pub fn at_row(self, index: usize) -> Self {
        match self {
            Self::SchemaMismatch { detail, .. } => Self::SchemaMismatch { row: Some(index), detail },
            other => other,
        }
    }
}

impl From<std::io::Error> for TriageError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
