mod decoder;
#[cfg(all(target_os = "linux", feature = "video_decoding"))]
mod gst;
mod selector;
mod sharpness;

pub use decoder::{BgrFrame, DecodeHandle, UnavailableDecoder, VideoDecoder};
#[cfg(all(target_os = "linux", feature = "video_decoding"))]
pub use gst::GstreamerDecoder;
pub use selector::{sample_positions, FrameCandidate, FrameSelector, SharpestFrame};
pub use sharpness::{laplacian_variance, sharpness_score};

use std::sync::Arc;

/// The best decoder this build supports
pub fn default_decoder() -> Arc<dyn VideoDecoder> {
    #[cfg(all(target_os = "linux", feature = "video_decoding"))]
    {
        match GstreamerDecoder::new() {
            Ok(decoder) => return Arc::new(decoder),
            Err(e) => tracing::warn!("GStreamer unavailable, video uploads will fail: {}", e),
        }
    }

    Arc::new(UnavailableDecoder)
}
