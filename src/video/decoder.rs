use image::RgbImage;
use std::path::Path;

use crate::error::FrameError;

/// One decoded frame with tightly packed BGR pixels, as decoders deliver them
#[derive(Debug, Clone)]
pub struct BgrFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl BgrFrame {
    /// Wrap raw BGR24 data, rejecting buffers of the wrong size
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Swap channels into standard RGB order
    pub fn into_rgb(self) -> RgbImage {
        let mut data = self.data;
        for pixel in data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
        // Length was checked in `new`
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

/// Backend able to open a video file by path
pub trait VideoDecoder: Send + Sync {
    fn name(&self) -> &str;

    /// Open the video; the returned handle releases its resources on drop
    fn open(&self, path: &Path) -> Result<Box<dyn DecodeHandle>, FrameError>;
}

/// An open video. Reads return `None` when the frame cannot be decoded.
pub trait DecodeHandle {
    /// Total frame count; zero or negative when the container does not say
    fn frame_count(&self) -> i64;

    /// Seek to a frame index and decode it
    fn read_at(&mut self, position: u64) -> Option<BgrFrame>;

    /// Decode the next frame in stream order
    fn read_next(&mut self) -> Option<BgrFrame>;
}

/// Decoder used when the build has no video backend
pub struct UnavailableDecoder;

impl VideoDecoder for UnavailableDecoder {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn open(&self, _path: &Path) -> Result<Box<dyn DecodeHandle>, FrameError> {
        Err(FrameError::unopenable(
            "video decoding is not available on this platform",
        ))
    }
}
