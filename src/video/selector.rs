use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::FrameConfig;
use crate::error::{FrameError, PlantDocError, Result};

use super::decoder::{DecodeHandle, VideoDecoder};
use super::sharpness::sharpness_score;

/// A decoded frame and its focus score
#[derive(Debug, Clone)]
pub struct FrameCandidate {
    pub position: u64,
    pub score: f64,
    pub image: RgbImage,
}

/// Keeps only the sharpest candidate seen so far; earlier frames win ties
#[derive(Debug, Default)]
pub struct SharpestFrame {
    best: Option<FrameCandidate>,
}

impl SharpestFrame {
    /// Returns true when the candidate replaced the current best
    pub fn offer(&mut self, candidate: FrameCandidate) -> bool {
        let better = match &self.best {
            Some(current) => candidate.score > current.score,
            None => true,
        };
        if better {
            self.best = Some(candidate);
        }
        better
    }

    pub fn into_best(self) -> Option<FrameCandidate> {
        self.best
    }
}

/// Evenly spaced frame indices: `floor(total * i / count)` for `count = min(max_samples, total)`
pub fn sample_positions(total: u64, max_samples: u32) -> Vec<u64> {
    let count = total.min(max_samples as u64);
    // Widened so containers reporting absurd frame counts cannot overflow
    (0..count)
        .map(|i| (total as u128 * i as u128 / count as u128) as u64)
        .collect()
}

/// Picks the sharpest frame of a video and returns it as JPEG
pub struct FrameSelector {
    decoder: Arc<dyn VideoDecoder>,
    max_samples: u32,
    jpeg_quality: u8,
    scratch_dir: Option<PathBuf>,
}

impl FrameSelector {
    pub fn new(config: &FrameConfig, decoder: Arc<dyn VideoDecoder>) -> Self {
        Self {
            decoder,
            max_samples: config.max_samples.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
            scratch_dir: config.scratch_dir.clone(),
        }
    }

    pub fn decoder_name(&self) -> &str {
        self.decoder.name()
    }

    /// Decode, score and encode. Blocks the calling thread.
    pub fn select_best_frame(&self, video: &[u8]) -> std::result::Result<Vec<u8>, FrameError> {
        let staged = self.stage(video)?;
        debug!(
            "Staged {} byte video at {} for {} decoder",
            video.len(),
            staged.path().display(),
            self.decoder.name()
        );

        // The handle is dropped before the staged file goes out of scope
        let best = {
            let mut handle = self.decoder.open(staged.path())?;
            self.scan(handle.as_mut())?
        };

        info!(
            "Selected frame {} with sharpness {:.2} ({}x{})",
            best.position,
            best.score,
            best.image.width(),
            best.image.height()
        );

        self.encode(&best.image)
    }

    /// Run selection on the blocking pool.
    ///
    /// The staged file and decode handle live inside the blocking closure, so
    /// they are released even if the awaiting task is dropped.
    pub async fn select_best_frame_async(self: Arc<Self>, video: Vec<u8>) -> Result<Vec<u8>> {
        tokio::task::spawn_blocking(move || self.select_best_frame(&video))
            .await
            .map_err(|e| PlantDocError::system(format!("Frame selection task failed: {}", e)))?
            .map_err(PlantDocError::from)
    }

    fn stage(&self, video: &[u8]) -> std::result::Result<NamedTempFile, FrameError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("plantdoc-").suffix(".video");

        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| FrameError::Scratch { source })?;

        file.write_all(video)
            .and_then(|_| file.flush())
            .map_err(|source| FrameError::Scratch { source })?;

        Ok(file)
    }

    fn scan(&self, handle: &mut dyn DecodeHandle) -> std::result::Result<FrameCandidate, FrameError> {
        let total = handle.frame_count();

        if total <= 0 {
            debug!("Frame count unavailable ({}), reading first frame", total);
            let frame = handle.read_next().ok_or(FrameError::NoReadableFrame)?;
            let image = frame.into_rgb();
            let score = sharpness_score(&image);
            return Ok(FrameCandidate {
                position: 0,
                score,
                image,
            });
        }

        let positions = sample_positions(total as u64, self.max_samples);
        debug!("Sampling {} of {} frames: {:?}", positions.len(), total, positions);

        let mut sharpest = SharpestFrame::default();
        for position in positions {
            let Some(frame) = handle.read_at(position) else {
                warn!("Could not decode frame {}, skipping", position);
                continue;
            };

            let image = frame.into_rgb();
            let score = sharpness_score(&image);
            debug!("Frame {} sharpness {:.2}", position, score);

            sharpest.offer(FrameCandidate {
                position,
                score,
                image,
            });
        }

        sharpest.into_best().ok_or(FrameError::NoUsableFrame)
    }

    fn encode(&self, image: &RgbImage) -> std::result::Result<Vec<u8>, FrameError> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
        encoder
            .encode_image(image)
            .map_err(|e| FrameError::Encode {
                details: e.to_string(),
            })?;
        Ok(buf)
    }
}
