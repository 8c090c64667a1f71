use gstreamer::prelude::*;
use gstreamer::{ClockTime, Pipeline, SeekFlags, State};
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::FrameError;

use super::decoder::{BgrFrame, DecodeHandle, VideoDecoder};

const PIPELINE_DESC: &str = "filesrc name=src ! \
     decodebin ! \
     videoconvert ! \
     video/x-raw,format=BGR ! \
     appsink name=sink sync=false max-buffers=1 enable-last-sample=false";

/// Software GStreamer decoder for uploaded video files
pub struct GstreamerDecoder {
    timeout: ClockTime,
}

impl GstreamerDecoder {
    pub fn new() -> Result<Self, FrameError> {
        gstreamer::init().map_err(|e| {
            FrameError::unopenable(format!("Failed to initialize GStreamer: {}", e))
        })?;

        info!("GStreamer video decoder initialized");
        Ok(Self {
            timeout: ClockTime::from_seconds(5),
        })
    }
}

impl VideoDecoder for GstreamerDecoder {
    fn name(&self) -> &str {
        "gstreamer"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DecodeHandle>, FrameError> {
        let location = path
            .to_str()
            .ok_or_else(|| FrameError::unopenable("video path is not valid UTF-8"))?;

        debug!("Creating decode pipeline for {}", location);

        let pipeline = gstreamer::parse::launch(PIPELINE_DESC)
            .map_err(|e| FrameError::unopenable(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| FrameError::unopenable("Failed to downcast to Pipeline"))?;

        let filesrc = pipeline
            .by_name("src")
            .ok_or_else(|| FrameError::unopenable("Failed to get filesrc element"))?;
        filesrc.set_property("location", location);

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| FrameError::unopenable("Failed to get appsink element"))?
            .downcast::<AppSink>()
            .map_err(|_| FrameError::unopenable("Failed to downcast to AppSink"))?;

        // From here on, Drop stops the pipeline on every exit path
        let mut handle = GstreamerHandle {
            pipeline,
            appsink,
            timeout: self.timeout,
            frame_count: -1,
            frame_duration_ns: 0,
            playing: false,
        };
        handle.preroll()?;

        Ok(Box::new(handle))
    }
}

struct GstreamerHandle {
    pipeline: Pipeline,
    appsink: AppSink,
    timeout: ClockTime,
    frame_count: i64,
    frame_duration_ns: u64,
    playing: bool,
}

impl GstreamerHandle {
    /// Pause the pipeline, wait for the first frame, and derive the frame count
    fn preroll(&mut self) -> Result<(), FrameError> {
        self.pipeline
            .set_state(State::Paused)
            .map_err(|e| FrameError::unopenable(format!("Failed to pause pipeline: {}", e)))?;

        let (result, _, _) = self.pipeline.state(self.timeout);
        result.map_err(|e| FrameError::unopenable(format!("Failed to preroll video: {}", e)))?;

        let sample = self
            .appsink
            .try_pull_preroll(self.timeout)
            .ok_or_else(|| FrameError::unopenable("No video stream found"))?;

        let caps = sample
            .caps()
            .ok_or_else(|| FrameError::unopenable("Decoded stream has no caps"))?;
        let video_info = VideoInfo::from_caps(caps)
            .map_err(|e| FrameError::unopenable(format!("Unreadable stream caps: {}", e)))?;

        let fps = video_info.fps();
        let (numer, denom) = (fps.numer() as u64, fps.denom() as u64);
        if numer > 0 && denom > 0 {
            self.frame_duration_ns = 1_000_000_000 * denom / numer;
        }

        if let Some(duration) = self.pipeline.query_duration::<ClockTime>() {
            if self.frame_duration_ns > 0 {
                self.frame_count =
                    i64::try_from(duration.nseconds() / self.frame_duration_ns).unwrap_or(-1);
            }
        }

        debug!(
            "Video prerolled: {}x{}, {}/{} fps, {} frames",
            video_info.width(),
            video_info.height(),
            numer,
            denom,
            self.frame_count
        );

        Ok(())
    }
}

impl DecodeHandle for GstreamerHandle {
    fn frame_count(&self) -> i64 {
        self.frame_count
    }

    fn read_at(&mut self, position: u64) -> Option<BgrFrame> {
        if self.playing || self.frame_duration_ns == 0 {
            return None;
        }

        let target = ClockTime::from_nseconds(position * self.frame_duration_ns);
        if let Err(e) = self
            .pipeline
            .seek_simple(SeekFlags::FLUSH | SeekFlags::ACCURATE, target)
        {
            debug!("Seek to frame {} failed: {}", position, e);
            return None;
        }

        let (result, _, _) = self.pipeline.state(self.timeout);
        if let Err(e) = result {
            debug!("Pipeline did not settle after seek to frame {}: {}", position, e);
            return None;
        }

        let sample = self.appsink.try_pull_preroll(self.timeout)?;
        sample_to_frame(&sample)
    }

    fn read_next(&mut self) -> Option<BgrFrame> {
        if !self.playing {
            if let Err(e) = self.pipeline.set_state(State::Playing) {
                debug!("Failed to start playback: {}", e);
                return None;
            }
            self.playing = true;
        }

        let sample = self.appsink.try_pull_sample(self.timeout)?;
        sample_to_frame(&sample)
    }
}

impl Drop for GstreamerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(State::Null) {
            warn!("Failed to stop decode pipeline cleanly: {}", e);
        }
        debug!("Decode pipeline released");
    }
}

/// Copy a BGR sample into a packed frame, dropping any row padding
fn sample_to_frame(sample: &gstreamer::Sample) -> Option<BgrFrame> {
    let caps = sample.caps()?;
    let video_info = VideoInfo::from_caps(caps).ok()?;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;

    let width = video_info.width();
    let height = video_info.height();
    let stride = video_info.stride()[0] as usize;
    let row_len = width as usize * 3;
    let bytes = map.as_slice();

    let mut data = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        data.extend_from_slice(bytes.get(start..start + row_len)?);
    }

    BgrFrame::new(width, height, data)
}
