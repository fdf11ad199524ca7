use anyhow::Result;
use async_trait::async_trait;

/// An image sent inline alongside a prompt.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Request to an inference provider: a prompt, optionally with one image.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

impl InferenceRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: InlineImage) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// Response from an inference provider.
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    /// Raw model text, possibly wrapped in markdown fences.
    pub text: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

/// Trait for the remote model that reads images and answers prompts.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Send one request and return the generated text.
    async fn generate(&self, request: &InferenceRequest) -> Result<InferenceResponse>;
}
