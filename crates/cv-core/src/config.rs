use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, TriageError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    pub dataset: DatasetConfig,
    pub artifacts: ArtifactConfig,
    pub extraction: ExtractionConfig,
    pub training: TrainingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    /// Simulated rows written on cold start when the dataset is empty; 0 disables.
    #[serde(default)]
    pub bootstrap_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub snapshot_file: String,
}

impl ArtifactConfig {
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(&self.snapshot_file)
    }
}

/// OpenAI-compatible chat completion backend used for feature extraction
/// and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ExtractionConfig {
    /// The backend is usable only with a non-empty API key.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Inverse L2 regularization strength (`C`).
    pub inverse_regularization: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig {
                path: PathBuf::from("data/civismart_dataset.jsonl"),
                bootstrap_rows: 0,
            },
            artifacts: ArtifactConfig {
                dir: PathBuf::from("models"),
                snapshot_file: "urgency_model.json".into(),
            },
            extraction: ExtractionConfig {
                endpoint: "https://api.openai.com".into(),
                model: "gpt-4o-mini".into(),
                api_key: None,
                timeout_secs: 20,
                temperature: None,
            },
            training: TrainingConfig::default(),
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
            },
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            inverse_regularization: 1.0,
            max_iter: 100,
            tolerance: 1e-6,
        }
    }
}

impl TriageConfig {
    /// Defaults overlaid with `CIVISMART_*` / `OPENAI_API_KEY` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`TriageConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = var("CIVISMART_DATASET") {
            cfg.dataset.path = PathBuf::from(v);
        }
        if let Some(v) = var("CIVISMART_BOOTSTRAP_ROWS") {
            cfg.dataset.bootstrap_rows = parse_number("CIVISMART_BOOTSTRAP_ROWS", &v)?;
        }
        if let Some(v) = var("CIVISMART_MODEL_DIR") {
            cfg.artifacts.dir = PathBuf::from(v);
        }
        if let Some(v) = var("OPENAI_API_KEY") {
            cfg.extraction.api_key = Some(v);
        }
        if let Some(v) = var("CIVISMART_LLM_ENDPOINT") {
            cfg.extraction.endpoint = v;
        }
        if let Some(v) = var("CIVISMART_LLM_MODEL") {
            cfg.extraction.model = v;
        }
        if let Some(v) = var("CIVISMART_LLM_TIMEOUT_SECS") {
            cfg.extraction.timeout_secs = parse_number("CIVISMART_LLM_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("CIVISMART_HOST") {
            cfg.server.host = v;
        }
        if let Some(v) = var("CIVISMART_PORT") {
            cfg.server.port = parse_number("CIVISMART_PORT", &v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = self.extraction.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(TriageError::Configuration(format!(
                "extraction endpoint must start with http:// or https://, got {endpoint:?}"
            )));
        }
        if self.extraction.model.trim().is_empty() {
            return Err(TriageError::Configuration("extraction model must not be empty".into()));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(TriageError::Configuration("extraction timeout must be positive".into()));
        }
        let c = self.training.inverse_regularization;
        if !(c.is_finite() && c > 0.0) {
            return Err(TriageError::Configuration(format!(
                "inverse regularization must be a positive number, got {c}"
            )));
        }
        if self.training.max_iter == 0 {
            return Err(TriageError::Configuration("max_iter must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        TriageError::Configuration(format!("invalid number in {var}: {value:?}"))
    })
}
