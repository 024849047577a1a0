use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use cv_core::config::ExtractionConfig;
use cv_core::{FeatureVector, TriageError};

use crate::source::{FeatureSource, LlmFeatureSource, SimulatedFeatureSource};

/// Features plus the name of the strategy that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub features: FeatureVector,
    pub source: String,
}

/// Priority-ordered external strategies followed by the simulated generator.
///
/// The final strategy is a separate, infallible field, so the chain can not
/// run out of options.
pub struct FeatureExtractor {
    external: Vec<Arc<dyn FeatureSource>>,
    fallback: SimulatedFeatureSource,
}

impl FeatureExtractor {
    pub fn new(fallback: SimulatedFeatureSource) -> Self {
        Self { external: Vec::new(), fallback }
    }

    pub fn simulated() -> Self {
        Self::new(SimulatedFeatureSource::new())
    }

    /// LLM strategy when an API key is configured, simulated otherwise.
    pub fn from_config(cfg: &ExtractionConfig) -> Self {
        let extractor = Self::simulated();
        if !cfg.is_configured() {
            debug!("no extraction backend configured; using simulated features only");
            return extractor;
        }
        match LlmFeatureSource::from_config(cfg) {
            Ok(source) => extractor.with_source(Arc::new(source)),
            Err(err) => {
                warn!(error = %err, "extraction backend misconfigured; using simulated features only");
                extractor
            }
        }
    }

    /// Append an external strategy at the lowest priority so far.
    pub fn with_source(mut self, source: Arc<dyn FeatureSource>) -> Self {
        self.external.push(source);
        self
    }

    pub fn has_external(&self) -> bool {
        !self.external.is_empty()
    }

    pub async fn extract(&self, report_text: &str, prefer_external: bool) -> FeatureVector {
        self.extract_traced(report_text, prefer_external).await.features
    }

    /// Run the chain. External failures are logged and swallowed.
    pub async fn extract_traced(&self, report_text: &str, prefer_external: bool) -> Extraction {
        if prefer_external {
            for source in &self.external {
                match source.extract(report_text).await {
                    Ok(features) => {
                        debug!(source = source.name(), "features extracted");
                        return Extraction { features, source: source.name().to_string() };
                    }
                    Err(err) => {
                        let err = TriageError::from(err);
                        warn!(source = source.name(), error = %err, "falling back to next extraction strategy");
                    }
                }
            }
        }
        Extraction {
            features: self.fallback.generate(),
            source: "simulated".into(),
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::simulated()
    }
}
