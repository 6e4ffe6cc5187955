//! Carousel Studio - carousel layout and animation timing engine
//!
//! Re-exports all modules for use by the binary target.

// Core engine (layout, timeline, composer, capture, events, workers)
pub mod core;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod dialogs;
pub mod entities;
pub mod render;
pub mod utils;

// Re-export commonly used types from core
pub use core::composer::{DrawCommand, DrawPlan, Labels, Theme};
pub use core::engine::{Engine, EngineConfig};
pub use core::events::{CarouselEvent, EventBus, Notice};
pub use core::timeline::{TimelineConfig, TimingStyle};

// Re-export entities
pub use entities::{ImageStore, SourceImage};
