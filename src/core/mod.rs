//! Core engine modules - layout, timeline, composer, capture, interaction
//!
//! Pure and UI-independent. Everything here runs on the frame thread except
//! `workers`, which decodes images in the background.

pub mod capture;
pub mod composer;
pub mod easing;
pub mod engine;
pub mod events;
pub mod interaction;
pub mod layout;
pub mod timeline;
pub mod workers;

// Re-exports for convenience
pub use capture::{CaptureConfig, CaptureDriver, CaptureError, CaptureSink, CaptureStep, RecordError};
pub use composer::{DrawCommand, DrawPlan, FrameComposer, Labels, TextAlign, TextMetrics, Theme};
pub use engine::{Engine, EngineConfig};
pub use events::{CarouselEvent, EventBus, Notice, NoticeLevel};
pub use layout::{CarouselState, SizeAssigner};
pub use timeline::{Timeline, TimelineConfig, TimingStyle};
pub use workers::Workers;
