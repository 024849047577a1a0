//! Extraction strategies.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

use cv_core::config::ExtractionConfig;
use cv_core::FeatureVector;

use crate::error::ExtractionError;
use crate::llm::{ChatClient, CompletionOptions};
use crate::parse::parse_feature_reply;
use crate::prompt::{feature_prompt, EXTRACTION_SYSTEM_PROMPT};

/// One way of turning report text into features. May fail.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self, report_text: &str) -> Result<FeatureVector, ExtractionError>;
}

/// Asks a chat model for the eight scores as JSON.
pub struct LlmFeatureSource {
    client: ChatClient,
    options: CompletionOptions,
    /// Hard cap on the whole call, on top of the HTTP client timeout.
    deadline: Duration,
}

impl LlmFeatureSource {
    pub fn new(client: ChatClient, temperature: Option<f32>) -> Self {
        let deadline = client.timeout() + Duration::from_secs(1);
        Self {
            client,
            options: CompletionOptions { temperature, max_tokens: None },
            deadline,
        }
    }

    pub fn from_config(cfg: &ExtractionConfig) -> Result<Self, ExtractionError> {
        Ok(Self::new(ChatClient::new(cfg)?, cfg.temperature))
    }
}

#[async_trait]
impl FeatureSource for LlmFeatureSource {
    fn name(&self) -> &str {
        self.client.model()
    }

    async fn extract(&self, report_text: &str) -> Result<FeatureVector, ExtractionError> {
        let prompt = feature_prompt(report_text);
        let call = self
            .client
            .complete(Some(EXTRACTION_SYSTEM_PROMPT), &prompt, self.options);
        let reply = tokio::time::timeout(self.deadline, call)
            .await
            .map_err(|_| ExtractionError::Timeout(self.deadline))??;
        debug!(reply_len = reply.len(), "feature reply received");
        parse_feature_reply(&reply)
    }
}

/// Uniform random scores rounded to two decimals. Never fails.
pub struct SimulatedFeatureSource {
    rng: Mutex<StdRng>,
}

impl SimulatedFeatureSource {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// Reproducible sequence for tests and dataset bootstrapping.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    pub fn generate(&self) -> FeatureVector {
        let mut rng = self.rng.lock();
        let mut draw = || (rng.gen_range(0.0..=1.0_f64) * 100.0).round() / 100.0;
        FeatureVector {
            danger_score: draw(),
            health_risk: draw(),
            environment_damage: draw(),
            infrastructure_damage: draw(),
            fire_risk: draw(),
            flooding_indicator: draw(),
            urgency_keywords_score: draw(),
            human_harm_risk: draw(),
        }
    }
}

impl Default for SimulatedFeatureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureSource for SimulatedFeatureSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn extract(&self, _report_text: &str) -> Result<FeatureVector, ExtractionError> {
        Ok(self.generate())
    }
}
