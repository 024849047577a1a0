//! Minimal OpenAI-compatible chat completion client.
//!
//! `POST {endpoint}/v1/chat/completions`, non-streaming, bearer auth. The
//! request timeout comes from [`ExtractionConfig::timeout_secs`].

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use cv_core::config::ExtractionConfig;

use crate::error::{make_snippet, ExtractionError};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    model: String,
    url_chat: String,
    timeout: Duration,
}

impl ChatClient {
    /// Validates the key and endpoint, then builds an HTTP client with default
    /// headers and the configured timeout.
    pub fn new(cfg: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ExtractionError::MissingApiKey)?;

        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ExtractionError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| ExtractionError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'));

        info!(model = %cfg.model, endpoint = %endpoint, timeout_secs = timeout.as_secs(), "chat client initialized");

        Ok(Self {
            client,
            model: cfg.model.clone(),
            url_chat,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One non-streaming completion; returns the first choice's content.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, ExtractionError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::new(&self.model, system, prompt, options);

        debug!(model = %self.model, prompt_len = prompt.len(), "POST {}", self.url_chat);

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                url = %self.url_chat,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );
            return Err(ExtractionError::HttpStatus {
                status,
                url: self.url_chat.clone(),
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            ExtractionError::Decode(format!("{e}; expected `choices[0].message.content`"))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ExtractionError::Decode("no choices with content".into()))?;

        debug!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion finished"
        );
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(model: &'a str, system: Option<&'a str>, prompt: &'a str, options: CompletionOptions) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage { role: "system", content: sys });
        }
        messages.push(ChatMessage { role: "user", content: prompt });
        Self {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
