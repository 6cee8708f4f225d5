//! Hosted language-model abstractions

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Model returned no text{}", .block_reason.as_deref().map(|r| format!(" (blocked: {})", r)).unwrap_or_default())]
    EmptyReply { block_reason: Option<String> },
}

/// Trait for a text-in, text-out generative model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one stateless prompt and return the reply text
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
