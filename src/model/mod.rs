mod classify;
mod gemini;
mod prompt;

pub use classify::classify_upstream;
pub use gemini::GeminiClient;
pub use prompt::ANALYSIS_PROMPT;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::error::ModelError;

/// Sampling settings forwarded to the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl From<&ModelConfig> for GenerationOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// One image analysis call
#[derive(Debug, Clone)]
pub struct VisionRequest<'a> {
    pub instruction: &'a str,
    pub image: &'a [u8],
    pub mime_type: &'a str,
    pub options: GenerationOptions,
}

/// An external vision-capable language model
#[async_trait]
pub trait VisionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a credential is available; checked before any request
    fn is_configured(&self) -> bool;

    /// Send the request and return the model's raw text reply
    async fn generate(&self, request: VisionRequest<'_>) -> Result<String, ModelError>;
}
