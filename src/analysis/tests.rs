use super::*;
use crate::diagnosis::HealthStatus;
use crate::error::{FrameError, InputError, ModelError, PlantDocError};
use crate::model::{GenerationOptions, VisionModel, VisionRequest, ANALYSIS_PROMPT};
use crate::normalizer::PARSE_FAILURE_SUMMARY;
use crate::video::{BgrFrame, DecodeHandle, VideoDecoder};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const DISEASED_REPLY: &str = r#"{"is_healthy": false, "plant_name": "Rose", "status": "diseased",
  "summary": "Black spot fungus on several leaves.", "confidence": "High",
  "problems": ["Black spot"], "reasons": ["Dark circular lesions"],
  "solutions": ["Remove affected leaves", "Apply fungicide"], "additional_tips": "Water at the base."}"#;

#[derive(Debug, Clone)]
struct RecordedRequest {
    instruction: String,
    mime_type: String,
    image: Vec<u8>,
    options: GenerationOptions,
}

enum Reply {
    Text(String),
    Fail(String),
}

struct FakeModel {
    configured: bool,
    reply: Reply,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeModel {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            reply: Reply::Text(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            reply: Reply::Fail(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            reply: Reply::Text(DISEASED_REPLY.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionModel for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: VisionRequest<'_>) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            instruction: request.instruction.to_string(),
            mime_type: request.mime_type.to_string(),
            image: request.image.to_vec(),
            options: request.options,
        });

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(ModelError::Upstream {
                message: message.clone(),
            }),
        }
    }
}

/// Treats files starting with "VIDEO" as a 30-frame clip of sharp frames
#[derive(Default)]
struct StubDecoder {
    opens: Arc<AtomicUsize>,
}

impl VideoDecoder for StubDecoder {
    fn name(&self) -> &str {
        "stub"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DecodeHandle>, FrameError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let bytes = std::fs::read(path).map_err(|e| FrameError::unopenable(e.to_string()))?;
        if bytes.starts_with(b"VIDEO") {
            Ok(Box::new(StubHandle))
        } else {
            Err(FrameError::unopenable("unrecognized container"))
        }
    }
}

struct StubHandle;

impl DecodeHandle for StubHandle {
    fn frame_count(&self) -> i64 {
        30
    }

    fn read_at(&mut self, _position: u64) -> Option<BgrFrame> {
        let data = (0..16 * 16)
            .flat_map(|i| {
                let v = if i % 2 == 0 { 20u8 } else { 230u8 };
                [v, v, v]
            })
            .collect();
        BgrFrame::new(16, 16, data)
    }

    fn read_next(&mut self) -> Option<BgrFrame> {
        self.read_at(0)
    }
}

fn orchestrator(model: Arc<FakeModel>) -> (AnalysisOrchestrator, Arc<AtomicUsize>) {
    let decoder = StubDecoder::default();
    let opens = Arc::clone(&decoder.opens);

    let orchestrator = AnalysisOrchestrator::builder()
        .model(model)
        .decoder(Arc::new(decoder))
        .max_upload_bytes(1024)
        .build()
        .unwrap();

    (orchestrator, opens)
}

#[tokio::test]
async fn test_diagnose_image_normalizes_reply() {
    let model = FakeModel::replying(DISEASED_REPLY);
    let (orchestrator, _) = orchestrator(Arc::clone(&model));

    let result = orchestrator
        .diagnose_image(b"fake png bytes", "image/png")
        .await
        .unwrap();

    assert_eq!(result.status, HealthStatus::Diseased);
    assert_eq!(result.plant_name, "Rose");
    assert_eq!(result.solutions.len(), 2);

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].instruction, ANALYSIS_PROMPT);
    assert_eq!(requests[0].mime_type, "image/png");
    assert_eq!(requests[0].image, b"fake png bytes".to_vec());
    assert_eq!(requests[0].options.max_output_tokens, 1500);
}

#[tokio::test]
async fn test_image_mime_alias_is_canonicalized() {
    let model = FakeModel::replying(DISEASED_REPLY);
    let (orchestrator, _) = orchestrator(Arc::clone(&model));

    orchestrator.diagnose_image(b"jpeg", "image/JPG").await.unwrap();

    assert_eq!(model.requests()[0].mime_type, "image/jpeg");
}

#[tokio::test]
async fn test_garbled_reply_becomes_parse_failure_result() {
    let model = FakeModel::replying("I'm sorry, I can't help with that.");
    let (orchestrator, _) = orchestrator(model);

    let result = orchestrator.diagnose_image(b"img", "image/webp").await.unwrap();

    assert_eq!(result.status, HealthStatus::Unknown);
    assert_eq!(result.summary, PARSE_FAILURE_SUMMARY);
}

#[tokio::test]
async fn test_missing_credential_fails_before_model_call() {
    let model = FakeModel::unconfigured();
    let (orchestrator, opens) = orchestrator(Arc::clone(&model));

    let image = orchestrator.diagnose_image(b"img", "image/png").await;
    assert!(matches!(
        image,
        Err(PlantDocError::Model(ModelError::NotConfigured))
    ));

    let video = orchestrator.diagnose_video(b"VIDEO clip".to_vec()).await;
    assert!(matches!(
        video,
        Err(PlantDocError::Model(ModelError::NotConfigured))
    ));

    assert!(model.requests().is_empty());
    assert_eq!(opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_failures_are_categorized() {
    let cases = [
        ("400 Bad Request: API_KEY_INVALID", "credential"),
        ("429 Too Many Requests", "rate"),
        ("You exceeded your current quota", "rate"),
        ("Prompt blocked by SAFETY filters: SAFETY", "blocked"),
        ("500 Internal Server Error", "upstream"),
    ];

    for (message, expected) in cases {
        let (orchestrator, _) = orchestrator(FakeModel::failing(message));
        let err = orchestrator
            .diagnose_image(b"img", "image/png")
            .await
            .unwrap_err();

        let category = match err {
            PlantDocError::Model(ModelError::InvalidCredential { .. }) => "credential",
            PlantDocError::Model(ModelError::RateLimited { .. }) => "rate",
            PlantDocError::Model(ModelError::ContentBlocked { .. }) => "blocked",
            PlantDocError::Model(ModelError::Upstream { message: raw }) => {
                assert_eq!(raw, message);
                "upstream"
            }
            other => panic!("unexpected error for {:?}: {}", message, other),
        };
        assert_eq!(category, expected, "message {:?}", message);
    }
}

#[tokio::test]
async fn test_diagnose_video_sends_jpeg_frame() {
    let model = FakeModel::replying(DISEASED_REPLY);
    let (orchestrator, opens) = orchestrator(Arc::clone(&model));

    let result = orchestrator
        .diagnose_video(b"VIDEO clip bytes".to_vec())
        .await
        .unwrap();

    assert_eq!(result.plant_name, "Rose");
    assert_eq!(opens.load(Ordering::SeqCst), 1);

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].mime_type, STILL_FRAME_MIME);
    assert_eq!(&requests[0].image[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_video_decode_failure_keeps_its_kind() {
    let model = FakeModel::replying(DISEASED_REPLY);
    let (orchestrator, _) = orchestrator(Arc::clone(&model));

    let result = orchestrator.diagnose_video(b"not a video".to_vec()).await;

    assert!(matches!(
        result,
        Err(PlantDocError::Frame(FrameError::UnopenableVideo { .. }))
    ));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_upload_limits() {
    let model = FakeModel::replying(DISEASED_REPLY);
    let (orchestrator, _) = orchestrator(Arc::clone(&model));

    let empty = orchestrator.diagnose_image(b"", "image/png").await;
    assert!(matches!(empty, Err(PlantDocError::Input(InputError::Empty))));

    let too_large = orchestrator.diagnose_video(vec![0u8; 2048]).await;
    assert!(matches!(
        too_large,
        Err(PlantDocError::Input(InputError::TooLarge { size: 2048, limit: 1024 }))
    ));

    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_diagnose_routes_by_media_type() {
    let model = FakeModel::replying(DISEASED_REPLY);
    let (orchestrator, opens) = orchestrator(Arc::clone(&model));

    orchestrator
        .diagnose(b"VIDEO".to_vec(), "video/mp4")
        .await
        .unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 1);

    orchestrator
        .diagnose(b"still".to_vec(), "image/gif")
        .await
        .unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(model.requests()[1].mime_type, "image/gif");

    let unsupported = orchestrator.diagnose(b"%PDF".to_vec(), "application/pdf").await;
    assert!(matches!(
        unsupported,
        Err(PlantDocError::Input(InputError::UnsupportedMedia { .. }))
    ));

    let video_as_image = orchestrator.diagnose_image(b"VIDEO", "video/mp4").await;
    assert!(matches!(
        video_as_image,
        Err(PlantDocError::Input(InputError::UnsupportedMedia { .. }))
    ));
}

#[tokio::test]
async fn test_best_frame_skips_model() {
    let model = FakeModel::unconfigured();
    let (orchestrator, _) = orchestrator(Arc::clone(&model));

    let jpeg = orchestrator.best_frame(b"VIDEO".to_vec()).await.unwrap();

    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert!(model.requests().is_empty());
}

#[test]
fn test_readiness_reports_configuration() {
    let (ready, _) = orchestrator(FakeModel::replying("{}"));
    let report = ready.readiness();
    assert!(report.model_configured);
    assert_eq!(report.model, "fake");
    assert_eq!(report.video_decoder, "stub");

    let (not_ready, _) = orchestrator(FakeModel::unconfigured());
    let report = not_ready.readiness();
    assert!(!report.model_configured);
    assert!(report.message.contains("GEMINI_API_KEY"));
}

#[test]
fn test_builder_requires_model() {
    let result = AnalysisOrchestrator::builder().build();

    match result {
        Err(PlantDocError::System { message }) => {
            assert!(message.contains("Vision model is required"))
        }
        _ => panic!("Expected system error for missing model"),
    }
}
