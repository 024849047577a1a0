//! Volunteer-facing chat assistant. Stateless; never fails.

use tracing::warn;

use cv_core::config::ExtractionConfig;

use crate::llm::{ChatClient, CompletionOptions};
use crate::prompt::ASSISTANT_SYSTEM_PROMPT;

pub const NO_KEY_REPLY: &str = "OpenAI API key not set. Cannot use chatbot.";

const OPTIONS: CompletionOptions = CompletionOptions {
    temperature: Some(0.7),
    max_tokens: Some(300),
};

pub struct Assistant {
    client: Option<ChatClient>,
}

impl Assistant {
    pub fn new(client: Option<ChatClient>) -> Self {
        Self { client }
    }

    pub fn from_config(cfg: &ExtractionConfig) -> Self {
        if !cfg.is_configured() {
            return Self::new(None);
        }
        match ChatClient::new(cfg) {
            Ok(client) => Self::new(Some(client)),
            Err(err) => {
                warn!(error = %err, "assistant backend misconfigured");
                Self::new(None)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub async fn reply(&self, user_message: &str) -> String {
        let Some(client) = &self.client else {
            return NO_KEY_REPLY.to_string();
        };
        match client.complete(Some(ASSISTANT_SYSTEM_PROMPT), user_message, OPTIONS).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "assistant call failed");
                format!("Error: {err}")
            }
        }
    }
}
