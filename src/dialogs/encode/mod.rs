//! Capture backend: video through FFmpeg, PNG sequences otherwise.
//!
//! FFmpeg is initialized on a background thread at startup. Until that
//! finishes the sink reports itself unavailable, so a recording request
//! made too early is rejected with a notice instead of blocking the UI.

pub mod encode;
pub mod frames;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use log::{info, warn};

use crate::core::capture::{CaptureConfig, CaptureError, CaptureSink};
use crate::utils::media;
pub use encode::{EncodeError, VideoEncoder};
pub use frames::FrameSequence;

const LOADING: u8 = 0;
const READY: u8 = 1;
const FAILED: u8 = 2;

/// FFmpeg load state shared between the init thread and the sink
#[derive(Clone, Debug)]
pub struct FfmpegStatus(Arc<AtomicU8>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendState {
    Loading,
    Ready,
    Failed,
}

impl FfmpegStatus {
    /// Start initializing FFmpeg on a background thread
    pub fn spawn_init() -> Self {
        let status = Self(Arc::new(AtomicU8::new(LOADING)));
        let shared = status.clone();
        let spawned = std::thread::Builder::new()
            .name("ffmpeg-init".into())
            .spawn(move || shared.run_init());
        if let Err(e) = spawned {
            warn!("Failed to spawn FFmpeg init thread: {}", e);
            status.0.store(FAILED, Ordering::Release);
        }
        status
    }

    /// Initialize on the calling thread (headless export)
    pub fn init_blocking() -> Self {
        let status = Self(Arc::new(AtomicU8::new(LOADING)));
        status.run_init();
        status
    }

    fn run_init(&self) {
        match encode::init_ffmpeg() {
            Ok(()) => {
                info!("FFmpeg ready");
                self.0.store(READY, Ordering::Release);
            }
            Err(e) => {
                warn!("FFmpeg unavailable, video export disabled: {}", e);
                self.0.store(FAILED, Ordering::Release);
            }
        }
    }

    pub fn state(&self) -> BackendState {
        match self.0.load(Ordering::Acquire) {
            LOADING => BackendState::Loading,
            READY => BackendState::Ready,
            _ => BackendState::Failed,
        }
    }
}

enum Active {
    Video(VideoEncoder),
    Frames(FrameSequence),
}

/// `CaptureSink` that picks video or PNG frames from the output path
pub struct ExportSink {
    ffmpeg: FfmpegStatus,
    active: Option<Active>,
}

impl ExportSink {
    pub fn new(ffmpeg: FfmpegStatus) -> Self {
        Self { ffmpeg, active: None }
    }
}

impl CaptureSink for ExportSink {
    fn is_available(&self) -> bool {
        self.ffmpeg.state() != BackendState::Loading
    }

    fn start_session(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        self.active = None;
        let active = if media::is_video(&config.output) {
            match self.ffmpeg.state() {
                BackendState::Loading => return Err(CaptureError::Unavailable),
                BackendState::Failed => {
                    return Err(CaptureError::StartFailed(
                        "FFmpeg failed to load; export to a folder for PNG frames".into(),
                    ))
                }
                BackendState::Ready => Active::Video(VideoEncoder::start(config)?),
            }
        } else {
            Active::Frames(FrameSequence::start(config)?)
        };
        self.active = Some(active);
        Ok(())
    }

    fn capture_frame(&mut self, frame: &RgbaImage) -> Result<(), CaptureError> {
        match self.active.as_mut() {
            Some(Active::Video(enc)) => enc.push(frame).map_err(CaptureError::from),
            Some(Active::Frames(seq)) => seq.push(frame),
            None => Err(CaptureError::FrameFailed("No capture session".into())),
        }
    }

    fn finalize_and_save(&mut self) -> Result<PathBuf, CaptureError> {
        match self.active.take() {
            Some(Active::Video(enc)) => enc.finish().map_err(CaptureError::from),
            Some(Active::Frames(seq)) => Ok(seq.finish()),
            None => Err(CaptureError::FinalizeFailed("No capture session".into())),
        }
    }

    fn abort(&mut self) {
        if let Some(Active::Video(enc)) = self.active.take() {
            warn!("Discarding unfinished video after {} frames", enc.frames_written());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: u8) -> FfmpegStatus {
        FfmpegStatus(Arc::new(AtomicU8::new(state)))
    }

    #[test]
    fn test_unavailable_while_loading() {
        let mut sink = ExportSink::new(status(LOADING));
        assert!(!sink.is_available());
        let config = CaptureConfig::new(64, 64, "out.mp4");
        assert_eq!(sink.start_session(&config), Err(CaptureError::Unavailable));
    }

    #[test]
    fn test_failed_ffmpeg_rejects_video_only() {
        let mut sink = ExportSink::new(status(FAILED));
        assert!(sink.is_available());
        let config = CaptureConfig::new(8, 8, "out.mp4");
        assert!(matches!(sink.start_session(&config), Err(CaptureError::StartFailed(_))));

        let dir = std::env::temp_dir().join(format!("carousel_export_{}", uuid::Uuid::new_v4()));
        sink.start_session(&CaptureConfig::new(8, 8, &dir)).unwrap();
        sink.capture_frame(&RgbaImage::new(8, 8)).unwrap();
        assert_eq!(sink.finalize_and_save(), Ok(dir.clone()));
        assert!(dir.join("frame_00000.png").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_capture_without_session() {
        let mut sink = ExportSink::new(status(READY));
        assert!(matches!(sink.capture_frame(&RgbaImage::new(1, 1)), Err(CaptureError::FrameFailed(_))));
        assert!(matches!(sink.finalize_and_save(), Err(CaptureError::FinalizeFailed(_))));
    }
}
