//! Capability providers: embedding and text generation
//!
//! Every model call in the pipeline goes through these traits so tests can
//! substitute deterministic fakes and call sites can swap models without
//! touching pipeline code.

pub mod ollama;

pub use ollama::OllamaProvider;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Embeds text into fixed-dimensionality vectors.
///
/// Must be deterministic for identical input and model version; the model
/// name is recorded on every index so build-time and query-time embedding
/// spaces can be checked for consistency.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Name of the embedding model, stored alongside built indexes
    fn model_name(&self) -> &str;
}

/// Role of a prompt message sent to a generative model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One message in a generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// A complete generation request: ordered messages, system prompt first
/// by convention
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub messages: Vec<PromptMessage>,
}

impl GenerateRequest {
    pub fn new(messages: Vec<PromptMessage>) -> Self {
        Self { messages }
    }

    /// Single-prompt convenience used by the evaluation judge
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![PromptMessage::user(prompt)],
        }
    }
}

/// Produces text from a chat-style request
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}
