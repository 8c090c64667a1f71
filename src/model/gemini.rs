//! Google Gemini `generateContent` client.
//!
//! Sends the instruction and the image (base64 inline data) in a single user
//! turn and returns the concatenated text of the first candidate. Failures
//! are reported as `ModelError::Upstream` with enough of the API's own wording
//! for `classify_upstream` to categorize them.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{VisionModel, VisionRequest};
use crate::config::ModelConfig;
use crate::error::{ModelError, PlantDocError, Result};

pub struct GeminiClient {
    config: ModelConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| PlantDocError::system(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model_name
        )
    }
}

// =============================================================================
// Gemini API Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

fn build_request(request: &VisionRequest<'_>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part {
                    text: Some(request.instruction.to_string()),
                    ..Default::default()
                },
                Part {
                    inline_data: Some(InlineData {
                        mime_type: request.mime_type.to_string(),
                        data: BASE64.encode(request.image),
                    }),
                    ..Default::default()
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: request.options.temperature,
            max_output_tokens: request.options.max_output_tokens,
        },
    }
}

/// Describe a non-success response, keeping the API's status and reason codes
fn upstream_error(status: reqwest::StatusCode, body: &str) -> ModelError {
    let message = match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => {
            let reasons: Vec<&str> = api_error
                .error
                .details
                .iter()
                .filter_map(|d| d.get("reason").and_then(|r| r.as_str()))
                .collect();

            // The API status (e.g. INVALID_ARGUMENT) stays out of the text classify_upstream reads
            debug!(
                "Model API status {}",
                api_error.error.status.as_deref().unwrap_or("unknown")
            );
            let mut message = format!("{}: {}", status, api_error.error.message);
            if !reasons.is_empty() {
                message.push_str(&format!(" [{}]", reasons.join(", ")));
            }
            message
        }
        Err(_) => format!("{}: {}", status, body.trim()),
    };

    ModelError::Upstream { message }
}

/// Pull the reply text out of a successful response body
fn parse_reply(body: &str) -> std::result::Result<String, ModelError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Upstream {
            message: format!("Failed to parse response: {}", e),
        })?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::Upstream {
            message: format!("Prompt blocked by SAFETY filters: {}", reason),
        });
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| ModelError::Upstream {
            message: "No candidates returned".to_string(),
        })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason == "SAFETY" || reason == "PROHIBITED_CONTENT" {
                return Err(ModelError::Upstream {
                    message: format!("Response blocked: finish reason SAFETY ({})", reason),
                });
            }
            warn!("Model returned no text (finish reason {})", reason);
        }
    }

    Ok(text)
}

#[async_trait]
impl VisionModel for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }

    async fn generate(&self, request: VisionRequest<'_>) -> std::result::Result<String, ModelError> {
        if !self.is_configured() {
            return Err(ModelError::NotConfigured);
        }

        let body = build_request(&request);
        debug!(
            "Sending {} byte {} image to {}",
            request.image.len(),
            request.mime_type,
            self.config.model_name
        );

        // API key goes in a header so it never shows up in logged URLs
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.config.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Upstream {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ModelError::Upstream {
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(upstream_error(status, &text));
        }

        let reply = parse_reply(&text)?;
        debug!("Model replied with {} characters", reply.len());
        Ok(reply)
    }
}
