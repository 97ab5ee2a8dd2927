use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Single-shot completion request: model identifier plus prompt text.
pub struct CompletionRequest {
    pub model: String,
    pub input: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
        }
    }
}

#[derive(Debug, Error)]
/// Enumerates supported `ModelError` values.
pub enum ModelError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error(
        "provider kept returning transient errors (last status {last_status}) after {attempts} attempts"
    )]
    TransientExhausted { attempts: usize, last_status: u16 },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    pub fn is_transient_exhaustion(&self) -> bool {
        matches!(self, Self::TransientExhausted { .. })
    }
}

#[async_trait]
/// Trait contract for completion backends that return plain text.
pub trait CompletionClient: Send + Sync {
    /// Returns the concatenated text output; an empty string means the model
    /// produced no text content.
    async fn complete_text(&self, request: CompletionRequest) -> Result<String, ModelError>;
}
