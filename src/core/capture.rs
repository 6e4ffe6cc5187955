//! Capture driver: frame counter and session lifecycle for video export.
//!
//! The driver owns a `CaptureSink` (the encoder side) and a
//! `RecordingSession`. Per rendered frame while recording:
//!
//! 1. `frame()` gives the elapsed frame count to evaluate (0 on the first frame)
//! 2. the frame is composed and rendered at that count
//! 3. `capture()` hands the pixels to the sink, then advances the counter by 1
//! 4. once the counter exceeds `target_stop_frame`, the sink is finalized
//!    and the session cleared
//!
//! So frames `0..=target_stop_frame` are captured, each exactly once.

use std::path::PathBuf;

use image::RgbaImage;
use log::{debug, info, warn};

/// Frame rate of exported video
pub const DEFAULT_FPS: u32 = 30;

/// Session parameters passed to the sink
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub output: PathBuf,
}

impl CaptureConfig {
    pub fn new(width: u32, height: u32, output: impl Into<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps: DEFAULT_FPS,
            output: output.into(),
        }
    }
}

/// Capture collaborator errors
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Backend not loaded (yet)
    Unavailable,
    StartFailed(String),
    FrameFailed(String),
    FinalizeFailed(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Unavailable => write!(f, "Video capture is still loading"),
            CaptureError::StartFailed(msg) => write!(f, "Failed to start capture: {}", msg),
            CaptureError::FrameFailed(msg) => write!(f, "Failed to capture frame: {}", msg),
            CaptureError::FinalizeFailed(msg) => write!(f, "Failed to save video: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Recording start rejections. None of these change any state.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    NoItems,
    CaptureNotReady,
    AlreadyRecording,
    Start(CaptureError),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::NoItems => write!(f, "Upload images first"),
            RecordError::CaptureNotReady => write!(f, "Video encoder is still loading, try again in a moment"),
            RecordError::AlreadyRecording => write!(f, "Already recording"),
            RecordError::Start(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<CaptureError> for RecordError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Unavailable => RecordError::CaptureNotReady,
            other => RecordError::Start(other),
        }
    }
}

/// Frame-by-frame video encoder
pub trait CaptureSink {
    /// False until the backend finished loading
    fn is_available(&self) -> bool;
    fn start_session(&mut self, config: &CaptureConfig) -> Result<(), CaptureError>;
    fn capture_frame(&mut self, frame: &RgbaImage) -> Result<(), CaptureError>;
    /// Flush and write the artifact; returns where it was saved
    fn finalize_and_save(&mut self) -> Result<PathBuf, CaptureError>;
    /// Drop a session without saving
    fn abort(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordingSession {
    pub active: bool,
    pub frame_counter: u32,
    pub target_stop_frame: u32,
}

/// Result of one `capture()` call
#[derive(Debug, PartialEq)]
pub enum CaptureStep {
    /// Not recording, nothing captured
    Idle,
    Captured { frame: u32 },
    Finished { frames: u32, output: PathBuf },
    Failed(CaptureError),
}

pub struct CaptureDriver {
    sink: Box<dyn CaptureSink>,
    session: Option<RecordingSession>,
}

impl CaptureDriver {
    pub fn new(sink: Box<dyn CaptureSink>) -> Self {
        Self { sink, session: None }
    }

    /// Swap the encoder backend. Ignored while a session is running.
    pub fn set_sink(&mut self, sink: Box<dyn CaptureSink>) {
        if self.session.is_some() {
            warn!("Cannot change capture backend while recording");
            return;
        }
        self.sink = sink;
    }

    pub fn is_available(&self) -> bool {
        self.sink.is_available()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some_and(|s| s.active)
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Elapsed frame count to evaluate this tick, `None` when not recording
    pub fn frame(&self) -> Option<u32> {
        self.session.filter(|s| s.active).map(|s| s.frame_counter)
    }

    /// Begin a capture session. On any error the driver stays idle.
    pub fn start(&mut self, item_count: usize, stop_frame: u32, config: &CaptureConfig) -> Result<(), RecordError> {
        if self.is_recording() {
            return Err(RecordError::AlreadyRecording);
        }
        if item_count == 0 {
            return Err(RecordError::NoItems);
        }
        if !self.sink.is_available() {
            return Err(RecordError::CaptureNotReady);
        }

        if let Err(e) = self.sink.start_session(config) {
            warn!("Capture start failed: {}", e);
            self.session = None;
            return Err(e.into());
        }

        info!(
            "Recording started: {}x{} @ {} fps, {} frames -> {}",
            config.width,
            config.height,
            config.fps,
            stop_frame.saturating_add(1),
            config.output.display()
        );
        self.session = Some(RecordingSession {
            active: true,
            frame_counter: 0,
            target_stop_frame: stop_frame,
        });
        Ok(())
    }

    /// Capture the frame rendered at `frame()`, then advance.
    pub fn capture(&mut self, frame: &RgbaImage) -> CaptureStep {
        let Some(mut session) = self.session.filter(|s| s.active) else {
            return CaptureStep::Idle;
        };

        if let Err(e) = self.sink.capture_frame(frame) {
            warn!("Recording aborted at frame {}: {}", session.frame_counter, e);
            self.sink.abort();
            self.session = None;
            return CaptureStep::Failed(e);
        }
        let captured = session.frame_counter;
        session.frame_counter = captured.saturating_add(1);

        if captured >= session.target_stop_frame {
            self.session = None;
            return match self.sink.finalize_and_save() {
                Ok(output) => {
                    info!("Recording finished: {} frames -> {}", session.frame_counter, output.display());
                    CaptureStep::Finished {
                        frames: session.frame_counter,
                        output,
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    CaptureStep::Failed(e)
                }
            };
        }

        debug!("Captured frame {}/{}", captured, session.target_stop_frame);
        self.session = Some(session);
        CaptureStep::Captured { frame: captured }
    }

    /// User stop: save what was captured so far
    pub fn stop(&mut self) -> CaptureStep {
        let Some(session) = self.session.take().filter(|s| s.active) else {
            return CaptureStep::Idle;
        };
        match self.sink.finalize_and_save() {
            Ok(output) => {
                info!("Recording stopped: {} frames -> {}", session.frame_counter, output.display());
                CaptureStep::Finished {
                    frames: session.frame_counter,
                    output,
                }
            }
            Err(e) => {
                warn!("{}", e);
                CaptureStep::Failed(e)
            }
        }
    }

    /// Stop without saving
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            info!("Recording cancelled");
            self.sink.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::timeline::{Timeline, TimelineConfig};
    use std::sync::{Arc, Mutex};

    /// What a `FakeSink` saw
    #[derive(Default, Debug)]
    pub(crate) struct SinkLog {
        pub started: u32,
        pub frames: u32,
        pub finalized: u32,
        pub aborted: u32,
    }

    /// In-memory sink with scripted failures
    pub(crate) struct FakeSink {
        pub available: bool,
        pub fail_start: bool,
        pub fail_at_frame: Option<u32>,
        pub log: Arc<Mutex<SinkLog>>,
    }

    impl FakeSink {
        pub fn ready() -> (Self, Arc<Mutex<SinkLog>>) {
            let log = Arc::new(Mutex::new(SinkLog::default()));
            let sink = Self {
                available: true,
                fail_start: false,
                fail_at_frame: None,
                log: Arc::clone(&log),
            };
            (sink, log)
        }
    }

    impl CaptureSink for FakeSink {
        fn is_available(&self) -> bool {
            self.available
        }

        fn start_session(&mut self, _config: &CaptureConfig) -> Result<(), CaptureError> {
            if self.fail_start {
                return Err(CaptureError::StartFailed("boom".into()));
            }
            let mut log = self.log.lock().unwrap();
            log.started += 1;
            log.frames = 0;
            Ok(())
        }

        fn capture_frame(&mut self, _frame: &RgbaImage) -> Result<(), CaptureError> {
            let mut log = self.log.lock().unwrap();
            if self.fail_at_frame == Some(log.frames) {
                return Err(CaptureError::FrameFailed("disk full".into()));
            }
            log.frames += 1;
            Ok(())
        }

        fn finalize_and_save(&mut self) -> Result<PathBuf, CaptureError> {
            self.log.lock().unwrap().finalized += 1;
            Ok(PathBuf::from("out.mp4"))
        }

        fn abort(&mut self) {
            self.log.lock().unwrap().aborted += 1;
        }
    }

    fn config() -> CaptureConfig {
        CaptureConfig::new(64, 32, "out.mp4")
    }

    #[test]
    fn test_start_preconditions() {
        let (mut sink, log) = FakeSink::ready();
        sink.available = false;
        let mut driver = CaptureDriver::new(Box::new(sink));

        assert_eq!(driver.start(0, 240, &config()), Err(RecordError::NoItems));
        assert_eq!(driver.start(3, 240, &config()), Err(RecordError::CaptureNotReady));
        assert!(!driver.is_recording());
        assert_eq!(log.lock().unwrap().started, 0);
    }

    #[test]
    fn test_start_failure_rolls_back() {
        let (mut sink, _log) = FakeSink::ready();
        sink.fail_start = true;
        let mut driver = CaptureDriver::new(Box::new(sink));
        let err = driver.start(3, 240, &config()).unwrap_err();
        assert!(matches!(err, RecordError::Start(CaptureError::StartFailed(_))));
        assert!(!driver.is_recording());
        assert_eq!(driver.frame(), None);
    }

    #[test]
    fn test_scripted_recording() {
        let (sink, log) = FakeSink::ready();
        let mut driver = CaptureDriver::new(Box::new(sink));
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        let stop = timeline.config().stop_frame();
        driver.start(3, stop, &config()).unwrap();

        let frame = RgbaImage::new(64, 32);
        let mut seen = Vec::new();
        let mut finished = None;
        while let Some(elapsed) = driver.frame() {
            let out = timeline.evaluate(elapsed, 3, 0.0);
            seen.push((elapsed, out.progress));
            if let CaptureStep::Finished { frames, .. } = driver.capture(&frame) {
                finished = Some(frames);
            }
        }

        assert_eq!(seen.first(), Some(&(0, 0.0)));
        let t_at = |f: u32| seen.iter().find(|(e, _)| *e == f).map(|(_, t)| *t);
        assert_eq!(t_at(30), Some(0.0));
        assert_eq!(t_at(90), Some(60.0));
        assert_eq!(t_at(120), Some(60.0));
        assert_eq!(t_at(150), Some(30.0));
        assert_eq!(seen.last().map(|(e, _)| *e), Some(240));
        assert_eq!(finished, Some(241));

        let log = log.lock().unwrap();
        assert_eq!(log.frames, 241);
        assert_eq!(log.finalized, 1);
        assert!(!driver.is_recording());
        assert_eq!(driver.capture(&frame), CaptureStep::Idle);
    }

    #[test]
    fn test_frame_failure_aborts() {
        let (mut sink, log) = FakeSink::ready();
        sink.fail_at_frame = Some(5);
        let mut driver = CaptureDriver::new(Box::new(sink));
        driver.start(1, 240, &config()).unwrap();
        let frame = RgbaImage::new(64, 32);
        let mut last = CaptureStep::Idle;
        while driver.is_recording() {
            last = driver.capture(&frame);
        }
        assert!(matches!(last, CaptureStep::Failed(CaptureError::FrameFailed(_))));
        let log = log.lock().unwrap();
        assert_eq!(log.aborted, 1);
        assert_eq!(log.finalized, 0);
    }

    #[test]
    fn test_stop_finalizes_and_cancel_discards() {
        let (sink, log) = FakeSink::ready();
        let mut driver = CaptureDriver::new(Box::new(sink));
        let frame = RgbaImage::new(1, 1);

        driver.start(1, 240, &config()).unwrap();
        for _ in 0..10 {
            driver.capture(&frame);
        }
        assert!(matches!(driver.stop(), CaptureStep::Finished { frames: 10, .. }));
        assert!(!driver.is_recording());

        driver.start(1, 240, &config()).unwrap();
        driver.capture(&frame);
        driver.cancel();

        let log = log.lock().unwrap();
        assert_eq!(log.finalized, 1);
        assert_eq!(log.aborted, 1);
    }

    #[test]
    fn test_restart_after_finish() {
        let (sink, log) = FakeSink::ready();
        let mut driver = CaptureDriver::new(Box::new(sink));
        let frame = RgbaImage::new(1, 1);
        for _ in 0..2 {
            driver.start(1, 3, &config()).unwrap();
            assert_eq!(driver.start(1, 3, &config()), Err(RecordError::AlreadyRecording));
            while driver.is_recording() {
                driver.capture(&frame);
            }
        }
        assert_eq!(log.lock().unwrap().finalized, 2);
    }
}
