use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use cv_core::TriageError;

/// Why an external extraction attempt failed. Always recovered by falling
/// back to the next strategy.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no API key configured for the extraction backend")]
    MissingApiKey,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("decode error: {0}")]
    Decode(String),

    /// Reply parsed but is not a valid eight-field feature object.
    #[error("reply does not match the feature schema: {0}")]
    Schema(String),
}

impl From<ExtractionError> for TriageError {
    fn from(err: ExtractionError) -> Self {
        TriageError::ExtractionUnavailable(err.to_string())
    }
}

/// First 200 characters of a response body, single-lined, for logs.
pub(crate) fn make_snippet(body: &str) -> String {
    let flat: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 200 {
        let cut: String = flat.chars().take(200).collect();
        format!("{cut}…")
    } else {
        flat
    }
}
