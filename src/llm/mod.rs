//! Language-model seam.
//!
//! Extraction and synthesis both talk to a model through [`LanguageModel`], a
//! single request/response call with no streaming and no retries. The
//! production implementation is [`openai::OpenAiClient`].

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiClient;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model provider rejected the API key")]
    Auth,

    #[error("model provider rate limit reached")]
    RateLimited,

    #[error("model provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("model client misconfigured: {0}")]
    Config(String),
}

/// One chat-style completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.0,
            json_mode: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
