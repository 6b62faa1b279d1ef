//! Remote model client.
//!
//! Thin boundary over the OpenAI-compatible chat-completion and embedding
//! endpoints. A 200 yields the raw JSON payload plus the reported token
//! usage; any other status becomes a [`DispatchError::Remote`] carrying the
//! status and payload, and nothing is retried. A per-request timeout from
//! the configuration keeps a hung remote call from blocking forever.

use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{DispatchError, Result};
use crate::models::PromptMessage;

/// Token margin reserved on top of the estimated prompt size.
const BUDGET_MARGIN: u64 = 256;

/// Approximate chars-per-token ratio used for the prompt estimate.
const CHARS_PER_TOKEN: usize = 4;

/// Largest completion budget requested regardless of context window.
const MAX_COMPLETION_TOKENS: u64 = 4096;

/// Client for the remote model service.
pub struct ModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Outcome of a successful chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub payload: Value,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ChatOutcome {
    /// The assistant message text from the response.
    pub fn message_content(&self) -> Result<String> {
        self.payload
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                DispatchError::Integrity("chat response is missing message content".into())
            })
    }
}

/// Outcome of a successful embedding request.
#[derive(Debug, Clone)]
pub struct EmbedOutcome {
    pub payload: Value,
    pub tokens: u64,
}

impl EmbedOutcome {
    /// Extract the embedding vectors, verifying that the reported index of
    /// every entry matches its position in the request. A mismatch would
    /// silently misalign every downstream ranking, so it aborts.
    pub fn vectors(&self) -> Result<Vec<Vec<f32>>> {
        let data = self
            .payload
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| {
                DispatchError::Integrity("embedding response is missing data array".into())
            })?;

        let mut embeddings = Vec::with_capacity(data.len());
        for (i, item) in data.iter().enumerate() {
            let index = item.get("index").and_then(|v| v.as_u64());
            if index != Some(i as u64) {
                return Err(DispatchError::Integrity(format!(
                    "embedding response out of order: entry {} reports index {:?}",
                    i, index
                )));
            }

            let vector: Vec<f32> = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .ok_or_else(|| {
                    DispatchError::Integrity(format!("embedding response entry {} has no vector", i))
                })?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();

            embeddings.push(vector);
        }

        Ok(embeddings)
    }
}

impl ModelClient {
    /// Build the client from configuration. The API key is read from the
    /// configured environment variable.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            DispatchError::Config(format!(
                "{} environment variable not set",
                config.api_key_env
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// One chat-completion request. `params` are merged into the body as-is.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[PromptMessage],
        max_tokens: u64,
        params: &Map<String, Value>,
        seed: Option<u64>,
    ) -> Result<ChatOutcome> {
        let mut body = params.clone();
        body.insert("model".to_string(), json!(model));
        body.insert("messages".to_string(), serde_json::to_value(messages)?);
        body.insert("max_tokens".to_string(), json!(max_tokens));
        if let Some(seed) = seed {
            body.insert("seed".to_string(), json!(seed));
        }

        let (status, payload) = self.post("chat/completions", &Value::Object(body)).await?;
        debug!(status, model, "chat completion returned");
        if status != 200 {
            return Err(DispatchError::Remote {
                status,
                body: payload,
            });
        }

        let input_tokens = payload
            .pointer("/usage/prompt_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let output_tokens = payload
            .pointer("/usage/completion_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(ChatOutcome {
            payload,
            input_tokens,
            output_tokens,
        })
    }

    /// One embedding request over a single text or a batch. The response
    /// preserves input order; [`EmbedOutcome::vectors`] verifies it.
    pub async fn embed(
        &self,
        model: &str,
        input: Value,
        params: &Map<String, Value>,
    ) -> Result<EmbedOutcome> {
        let mut body = params.clone();
        // The wire name for the output format differs from the setting key.
        if let Some(format) = body.remove("format") {
            body.insert("encoding_format".to_string(), format);
        }
        body.insert("model".to_string(), json!(model));
        body.insert("input".to_string(), input);

        let (status, payload) = self.post("embeddings", &Value::Object(body)).await?;
        debug!(status, model, "embedding request returned");
        if status != 200 {
            return Err(DispatchError::Remote {
                status,
                body: payload,
            });
        }

        let tokens = payload
            .pointer("/usage/total_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(EmbedOutcome { payload, tokens })
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<(u16, Value)> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let payload = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }));
        Ok((status, payload))
    }
}

/// Completion-token budget for a chat request: the model's context window
/// minus the estimated prompt size and a safety margin, capped at the
/// largest completion the endpoint accepts. Always at least 16.
pub fn token_budget(model: &str, messages: &[PromptMessage]) -> u64 {
    let window = context_window(model);
    let prompt_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    let prompt_tokens = (prompt_chars / CHARS_PER_TOKEN) as u64;

    window
        .saturating_sub(prompt_tokens)
        .saturating_sub(BUDGET_MARGIN)
        .clamp(16, MAX_COMPLETION_TOKENS)
}

/// Context window sizes for the supported checkpoint families, with a
/// conservative fallback for unknown models.
fn context_window(model: &str) -> u64 {
    if model.starts_with("gpt-4o") || model.starts_with("gpt-4-turbo") {
        128_000
    } else if model.starts_with("gpt-4") {
        8_192
    } else if model.starts_with("gpt-3.5-turbo") {
        16_385
    } else {
        8_192
    }
}
