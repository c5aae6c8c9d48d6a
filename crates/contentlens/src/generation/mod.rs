//! The text generation capability the lifecycle controller calls out to.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Binary payload sent alongside the prompt, e.g. an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub attachments: Vec<Attachment>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.attachments.push(Attachment {
            mime_type: mime_type.into(),
            data,
        });
        self
    }
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends one prompt and returns the model's markdown answer. Never retried.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Request to generation API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generation API rate limit or quota exceeded: {message}")]
    RateLimited { message: String },

    #[error("Generation API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from generation API: {0}")]
    InvalidResponse(String),

    #[error("Generation API returned no text: {0}")]
    EmptyResponse(String),
}
