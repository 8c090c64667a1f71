pub mod analysis;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod video;

pub use analysis::{AnalysisOrchestrator, AnalysisOrchestratorBuilder, MediaKind, Readiness};
pub use config::PlantDocConfig;
pub use diagnosis::{DiagnosisResult, HealthStatus};
pub use error::{FrameError, InputError, ModelError, PlantDocError, Result};
pub use model::{GeminiClient, GenerationOptions, VisionModel, VisionRequest};
pub use normalizer::{normalize, RawReply};
pub use video::{FrameSelector, VideoDecoder};
