//! Carousel engine: the one context object the frame loop talks to.
//!
//! Holds the accepted entries, the current `CarouselState` snapshot, the
//! timeline, the interaction controller and the capture driver. There are
//! no globals; the app owns one `Engine` and calls, per frame:
//!
//! ```ignore
//! engine.accept(decoded);                                  // between frames
//! let plan = engine.frame_plan(&mut text, viewport_w, pointer_x);
//! surface.execute(&plan);
//! engine.finish_frame(&pixels);                            // only if recording
//! ```
//!
//! `accept()` and `reset()` build a new `CarouselState` and swap the `Arc`,
//! so a plan composed earlier keeps seeing the snapshot it was built from.

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, info};

use super::capture::{CaptureConfig, CaptureDriver, CaptureSink, CaptureStep, RecordError};
use super::composer::{landing_scroll, DrawPlan, FrameComposer, Labels, TextMetrics, Theme};
use super::events::{CarouselEvent, EventBus, Notice};
use super::interaction::InteractionController;
use super::layout::{CarouselEntry, CarouselState, SizeAssigner};
use super::timeline::{Timeline, TimelineConfig, TimelineOutput, TimingStyle};
use crate::entities::text::{LabelFont, TextMeasure};
use crate::entities::SourceImage;

/// Default gap between neighbouring images
pub const DEFAULT_PADDING: f32 = 20.0;

/// Startup parameters
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub timeline: TimelineConfig,
    pub padding: f32,
    pub labels: Labels,
    pub theme: Theme,
    /// Bucket RNG seed, `None` for OS entropy
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            padding: DEFAULT_PADDING,
            labels: Labels::default(),
            theme: Theme::default(),
            seed: None,
        }
    }
}

pub struct Engine {
    entries: Vec<CarouselEntry>,
    assigner: SizeAssigner,
    state: Arc<CarouselState>,
    padding: f32,
    timeline: Timeline,
    composer: FrameComposer,
    labels: Labels,
    interaction: InteractionController,
    capture: CaptureDriver,
    events: EventBus,
    last_output: Option<TimelineOutput>,
}

impl Engine {
    pub fn new(config: EngineConfig, sink: Box<dyn CaptureSink>) -> Self {
        let style = config.timeline.style;
        Self {
            entries: Vec::new(),
            assigner: SizeAssigner::new(config.seed),
            state: Arc::new(CarouselState::rebuild(&[], config.padding.max(0.0))),
            padding: config.padding.max(0.0),
            timeline: Timeline::new(config.timeline),
            composer: FrameComposer::new(style, config.theme),
            labels: config.labels,
            interaction: InteractionController::new(),
            capture: CaptureDriver::new(sink),
            events: EventBus::new(),
            last_output: None,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Current layout snapshot
    pub fn state(&self) -> Arc<CarouselState> {
        Arc::clone(&self.state)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn theme(&self) -> Theme {
        self.composer.theme
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    pub fn capture_available(&self) -> bool {
        self.capture.is_available()
    }

    /// Elapsed frames of the running recording
    pub fn recording_frame(&self) -> Option<u32> {
        self.capture.frame()
    }

    /// Timeline state of the last composed frame
    pub fn last_output(&self) -> Option<&TimelineOutput> {
        self.last_output.as_ref()
    }

    pub fn set_capture_sink(&mut self, sink: Box<dyn CaptureSink>) {
        self.capture.set_sink(sink);
    }

    /// Append decoded images in order. Each gets its size bucket exactly once.
    pub fn accept(&mut self, images: Vec<Arc<SourceImage>>) {
        if images.is_empty() {
            return;
        }
        let added = images.len();
        for image in images {
            let previous = self.entries.last().map(|e| e.size.bucket);
            let size = self.assigner.assign(previous);
            debug!("Accepted {} -> bucket {} height {:.1}", image.name(), size.bucket, size.height);
            self.entries.push(CarouselEntry::new(image, size));
        }
        self.rebuild();
        info!("Accepted {} image(s), {} total", added, self.entries.len());
        self.events.emit(CarouselEvent::ImagesAccepted {
            added,
            total: self.entries.len(),
        });
    }

    /// Clear the collection. A running recording is cancelled.
    pub fn reset(&mut self) {
        if self.capture.is_recording() {
            self.capture.cancel();
            self.events.notify(Notice::warning("Recording cancelled"));
        }
        self.entries.clear();
        self.interaction.reset();
        self.rebuild();
        info!("Carousel reset");
        self.events.emit(CarouselEvent::CarouselReset);
    }

    pub fn set_padding(&mut self, padding: f32) {
        if self.is_recording() || padding == self.padding {
            return;
        }
        self.padding = padding.max(0.0);
        self.rebuild();
    }

    pub fn set_labels(&mut self, labels: Labels) {
        self.labels = labels;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.composer.theme = theme;
    }

    /// Switch timing preset. Ignored while recording.
    pub fn set_style(&mut self, style: TimingStyle) {
        if self.is_recording() || style == self.timeline.config().style {
            return;
        }
        let mut config = TimelineConfig::preset(style);
        config.delay = self.timeline.config().delay;
        self.set_timeline(config);
    }

    pub fn set_timeline(&mut self, config: TimelineConfig) {
        if self.is_recording() {
            return;
        }
        info!("Timing style: {}", config.style.as_str());
        self.composer.style = config.style;
        self.timeline = Timeline::new(config);
    }

    fn rebuild(&mut self) {
        let state = CarouselState::rebuild(&self.entries, self.padding);
        debug!("Layout rebuilt: {} items, total width {:.1}", state.len(), state.total_width);
        self.events.emit(CarouselEvent::LayoutRebuilt {
            items: state.len(),
            total_width: state.total_width,
        });
        self.state = Arc::new(state);
    }

    /// Reset scroll and progress, then begin capture. Failures are also
    /// posted as notices; nothing changes when this returns `Err`.
    pub fn start_recording(&mut self, config: &CaptureConfig) -> Result<(), RecordError> {
        let stop_frame = self.timeline.config().stop_frame();
        match self.capture.start(self.state.len(), stop_frame, config) {
            Ok(()) => {
                self.interaction.reset();
                self.events.emit(CarouselEvent::RecordingStarted {
                    stop_frame,
                    output: config.output.clone(),
                });
                Ok(())
            }
            Err(e) => {
                self.events.notify(Notice::warning(e.to_string()));
                Err(e)
            }
        }
    }

    /// Drop the running recording without saving (reset)
    pub fn cancel_recording(&mut self) {
        self.capture.cancel();
    }

    /// User stop: finalize what was captured so far and save it
    pub fn stop_recording(&mut self) -> CaptureStep {
        let step = self.capture.stop();
        self.report(&step);
        step
    }

    /// Measure both labels for the current text
    pub fn measure(&self, text: &mut dyn TextMeasure) -> TextMetrics {
        let size = self.composer.text_size;
        TextMetrics {
            left_width: text.text_width(&self.labels.left, LabelFont::Serif, size),
            right_width: text.text_width(&self.labels.right, LabelFont::Sans, size),
        }
    }

    /// Evaluate and compose one frame.
    ///
    /// Recording: scripted timeline at the driver's frame counter, pointer
    /// ignored. Otherwise: fully open, scroll from the pointer.
    pub fn frame_plan(&mut self, text: &mut dyn TextMeasure, viewport_width: f32, pointer_x: Option<f32>) -> DrawPlan {
        let metrics = self.measure(text);
        let state = Arc::clone(&self.state);

        let output = match self.capture.frame() {
            Some(elapsed) => {
                // Landing uses this frame's metrics
                let landing = landing_scroll(&state, self.timeline.config().text_gap, metrics);
                self.timeline.evaluate(elapsed, state.len(), landing)
            }
            None => {
                let scroll = self.interaction.tick(pointer_x, viewport_width, state.total_width, state.len());
                self.timeline.evaluate_manual(state.len(), scroll)
            }
        };

        let plan = self.composer.compose(&state, &output, &self.labels, metrics, viewport_width);
        self.last_output = Some(output);
        plan
    }

    /// Fully-open plan at the current scroll, without advancing the
    /// smoothing (snapshots). Headless runs never scroll, so they get the
    /// centered layout.
    pub fn still_plan(&self, text: &mut dyn TextMeasure, viewport_width: f32) -> DrawPlan {
        let metrics = self.measure(text);
        let output = self.timeline.evaluate_manual(self.state.len(), self.interaction.current());
        self.composer.compose(&self.state, &output, &self.labels, metrics, viewport_width)
    }

    /// Hand the rendered pixels of a recorded frame to the capture driver.
    pub fn finish_frame(&mut self, frame: &RgbaImage) -> CaptureStep {
        let step = self.capture.capture(frame);
        self.report(&step);
        step
    }

    fn report(&self, step: &CaptureStep) {
        match step {
            CaptureStep::Finished { frames, output } => {
                self.events.emit(CarouselEvent::RecordingFinished {
                    frames: *frames,
                    output: output.clone(),
                });
                self.events.notify(Notice::info(format!("Saved {}", output.display())));
            }
            CaptureStep::Failed(e) => self.events.notify(Notice::error(e.to_string())),
            CaptureStep::Idle | CaptureStep::Captured { .. } => {}
        }
    }
}
