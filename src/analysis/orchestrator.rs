use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{FrameConfig, PlantDocConfig};
use crate::diagnosis::DiagnosisResult;
use crate::error::{InputError, ModelError, PlantDocError, Result};
use crate::model::{
    classify_upstream, GeminiClient, GenerationOptions, VisionModel, VisionRequest,
    ANALYSIS_PROMPT,
};
use crate::normalizer::normalize;
use crate::video::{default_decoder, FrameSelector, VideoDecoder};

use super::media::{
    canonical_mime, check_upload_size, media_kind, MediaKind, STILL_FRAME_MIME,
};

/// Whether the service can take requests, as reported by `plantdoc check`
#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub model_configured: bool,
    pub model: String,
    pub video_decoder: String,
    pub message: String,
}

/// Routes uploads through frame selection, the vision model and normalization
pub struct AnalysisOrchestrator {
    model: Arc<dyn VisionModel>,
    selector: Arc<FrameSelector>,
    options: GenerationOptions,
    max_upload_bytes: usize,
}

impl AnalysisOrchestrator {
    /// Production wiring: Gemini client plus the platform video decoder
    pub fn new(config: &PlantDocConfig) -> Result<Self> {
        info!(
            "Creating analysis orchestrator (model {}, {} frame samples)",
            config.model.model_name, config.frames.max_samples
        );

        let model = GeminiClient::new(config.model.clone())?;

        AnalysisOrchestratorBuilder::new()
            .model(Arc::new(model))
            .decoder(default_decoder())
            .frame_config(config.frames.clone())
            .options(GenerationOptions::from(&config.model))
            .max_upload_bytes(config.limits.max_upload_bytes)
            .build()
    }

    pub fn builder() -> AnalysisOrchestratorBuilder {
        AnalysisOrchestratorBuilder::new()
    }

    /// Diagnose a photo
    pub async fn diagnose_image(&self, bytes: &[u8], mime_type: &str) -> Result<DiagnosisResult> {
        let span = info_span!("diagnose", request_id = %Uuid::new_v4(), kind = "image");

        async {
            check_upload_size(bytes.len(), self.max_upload_bytes)?;
            if media_kind(mime_type)? != MediaKind::Image {
                return Err(InputError::UnsupportedMedia {
                    mime_type: mime_type.to_string(),
                }
                .into());
            }

            self.analyze(bytes, &canonical_mime(mime_type)).await
        }
        .instrument(span)
        .await
    }

    /// Diagnose the sharpest frame of a short video
    pub async fn diagnose_video(&self, bytes: Vec<u8>) -> Result<DiagnosisResult> {
        let span = info_span!("diagnose", request_id = %Uuid::new_v4(), kind = "video");

        async {
            check_upload_size(bytes.len(), self.max_upload_bytes)?;
            self.ensure_configured()?;

            let frame = self.select_frame(bytes).await?;
            self.analyze(&frame, STILL_FRAME_MIME).await
        }
        .instrument(span)
        .await
    }

    /// Route an upload by its media type
    pub async fn diagnose(&self, bytes: Vec<u8>, mime_type: &str) -> Result<DiagnosisResult> {
        match media_kind(mime_type)? {
            MediaKind::Image => self.diagnose_image(&bytes, mime_type).await,
            MediaKind::Video => self.diagnose_video(bytes).await,
        }
    }

    /// Only the frame-selection half of `diagnose_video`
    pub async fn best_frame(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        check_upload_size(bytes.len(), self.max_upload_bytes)?;
        self.select_frame(bytes).await
    }

    pub fn readiness(&self) -> Readiness {
        let configured = self.model.is_configured();

        Readiness {
            status: "ok",
            model_configured: configured,
            model: self.model.name().to_string(),
            video_decoder: self.selector.decoder_name().to_string(),
            message: if configured {
                "Ready to analyse plants".to_string()
            } else {
                "Model API key is not set (GEMINI_API_KEY)".to_string()
            },
        }
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.model.is_configured() {
            Ok(())
        } else {
            error!("Rejecting request: {} model has no API key", self.model.name());
            Err(ModelError::NotConfigured.into())
        }
    }

    async fn select_frame(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        debug!("Selecting best frame from {} byte video", bytes.len());

        let frame = Arc::clone(&self.selector)
            .select_best_frame_async(bytes)
            .await
            .map_err(|e| {
                error!("Frame selection failed: {}", e);
                e
            })?;

        info!("Extracted {} byte still frame from video", frame.len());
        Ok(frame)
    }

    async fn analyze(&self, image: &[u8], mime_type: &str) -> Result<DiagnosisResult> {
        self.ensure_configured()?;

        let request = VisionRequest {
            instruction: ANALYSIS_PROMPT,
            image,
            mime_type,
            options: self.options,
        };

        let reply = self.model.generate(request).await.map_err(|e| {
            let classified = classify_upstream(e);
            error!("Vision model call failed: {}", classified);
            PlantDocError::from(classified)
        })?;

        let result = normalize(&reply);
        info!(
            "Diagnosis complete: {} ({}, confidence {})",
            result.status, result.plant_name, result.confidence
        );

        Ok(result)
    }
}

/// Builder for AnalysisOrchestrator
pub struct AnalysisOrchestratorBuilder {
    model: Option<Arc<dyn VisionModel>>,
    decoder: Option<Arc<dyn VideoDecoder>>,
    frame_config: FrameConfig,
    options: Option<GenerationOptions>,
    max_upload_bytes: Option<usize>,
}

impl AnalysisOrchestratorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            model: None,
            decoder: None,
            frame_config: FrameConfig::default(),
            options: None,
            max_upload_bytes: None,
        }
    }

    /// Set the vision model
    pub fn model(mut self, model: Arc<dyn VisionModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the video decoder backend
    pub fn decoder(mut self, decoder: Arc<dyn VideoDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Set frame sampling and encoding options
    pub fn frame_config(mut self, frame_config: FrameConfig) -> Self {
        self.frame_config = frame_config;
        self
    }

    /// Set the generation options sent with each request
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the upload size limit
    pub fn max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = Some(limit);
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> Result<AnalysisOrchestrator> {
        let model = self
            .model
            .ok_or_else(|| PlantDocError::system("Vision model is required"))?;

        let defaults = PlantDocConfig::default();
        let decoder = self.decoder.unwrap_or_else(default_decoder);

        Ok(AnalysisOrchestrator {
            model,
            selector: Arc::new(FrameSelector::new(&self.frame_config, decoder)),
            options: self
                .options
                .unwrap_or_else(|| GenerationOptions::from(&defaults.model)),
            max_upload_bytes: self
                .max_upload_bytes
                .unwrap_or(defaults.limits.max_upload_bytes),
        })
    }
}

impl Default for AnalysisOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
