//! Ollama-backed provider for embeddings and chat generation
//!
//! Thin HTTP client over the local Ollama server. Every call carries a
//! deadline and a bounded retry policy; embedding and generation are
//! read-only calls, so retrying them is safe.

use crate::config::OllamaConfig;
use crate::errors::{ChatError, Result};
use crate::providers::{EmbeddingProvider, GenerateRequest, GenerativeProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before the first retry; doubles per attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// HTTP provider for the Ollama API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    timeout: Duration,
    max_retries: u32,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ChatError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            timeout: config.timeout(),
            max_retries: config.max_retries,
        })
    }

    /// Same connection settings, different chat model. Used to derive the
    /// judge provider for evaluation runs.
    pub fn with_chat_model(&self, model: &str) -> Self {
        Self {
            chat_model: model.to_string(),
            ..self.clone()
        }
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// Check if the Ollama server is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).timeout(Duration::from_secs(2)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// POST a JSON body with timeout and bounded retry, returning the
    /// deserialized response body.
    async fn post_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;

        loop {
            let outcome = tokio::time::timeout(
                self.timeout,
                self.client.post(&url).json(&body).send(),
            )
            .await;

            let err = match outcome {
                Err(_) => ChatError::Timeout {
                    duration_ms: self.timeout.as_millis() as u64,
                },
                Ok(Err(e)) => ChatError::Http(e),
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<T>().await.map_err(ChatError::Http);
                    }
                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "unknown error".to_string());
                    let err =
                        ChatError::GenerationFailure(format!("HTTP {}: {}", status, text));
                    // Client errors (unknown model, malformed request) do
                    // not heal on retry
                    if status.is_client_error() {
                        return Err(err);
                    }
                    err
                }
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;
            let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
            warn!(%url, attempt, error = %err, "provider call failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), model = %self.embedding_model, "embedding texts");

        let body = json!({
            "model": self.embedding_model,
            "input": texts,
        });

        let response: EmbedResponse = self
            .post_with_retry("/api/embed", body)
            .await
            .map_err(|e| match e {
                ChatError::Timeout { .. } => e,
                other => ChatError::EmbeddingFailure(other.to_string()),
            })?;

        if response.embeddings.len() != texts.len() {
            return Err(ChatError::EmbeddingFailure(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl GenerativeProvider for OllamaProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let body = json!({
            "model": self.chat_model,
            "messages": request.messages,
            "stream": false,
        });

        let response: ChatResponse = self
            .post_with_retry("/api/chat", body)
            .await
            .map_err(|e| match e {
                ChatError::Timeout { .. } => e,
                other => ChatError::GenerationFailure(other.to_string()),
            })?;

        Ok(response.message.content)
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
