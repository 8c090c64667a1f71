mod media;
mod orchestrator;
#[cfg(test)]
mod tests;

pub use media::{
    canonical_mime, check_upload_size, media_kind, mime_from_path, sniff_image_mime, MediaKind,
    IMAGE_TYPES, STILL_FRAME_MIME, VIDEO_TYPES,
};
pub use orchestrator::{AnalysisOrchestrator, AnalysisOrchestratorBuilder, Readiness};
