use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::core::timeline::TimingStyle;

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Text:   cosmic-text 0.15\n",
    "Video:  playa-ffmpeg 8.0 (static)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Timing preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// Open, hold, close again
    HoldReverse,
    /// Anticipation pan, glide onto the right label
    PanGlide,
}

impl From<StyleArg> for TimingStyle {
    fn from(s: StyleArg) -> Self {
        match s {
            StyleArg::HoldReverse => TimingStyle::HoldAndReverse,
            StyleArg::PanGlide => TimingStyle::PanAndGlide,
        }
    }
}

/// Animated image carousel with scripted video export
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Images to load at startup (PNG, JPEG, GIF, WebP, ...) - can also drag-and-drop
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Left label text (serif)
    #[arg(long = "left", value_name = "TEXT")]
    pub left: Option<String>,

    /// Right label text (sans)
    #[arg(long = "right", value_name = "TEXT")]
    pub right: Option<String>,

    /// Timing style of the scripted sequence
    #[arg(short = 's', long = "style", value_enum)]
    pub style: Option<StyleArg>,

    /// Gap between images in pixels
    #[arg(long = "padding", value_name = "PX")]
    pub padding: Option<f32>,

    /// Frames before anything moves
    #[arg(long = "delay", value_name = "FRAMES")]
    pub delay: Option<u32>,

    /// Black text on white
    #[arg(long = "light")]
    pub light: bool,

    /// Seed for image size assignment (reproducible layouts)
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Render the scripted sequence to a video file (or PNG directory) and exit
    #[arg(short = 'e', long = "export", value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Render the fully open layout to a PNG and exit
    #[arg(long = "snapshot", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Canvas width for headless output
    #[arg(long = "width", value_name = "PX", default_value = "1920")]
    pub width: u32,

    /// Canvas height for headless output
    #[arg(long = "height", value_name = "PX", default_value = "1080")]
    pub height: u32,

    /// Export frame rate
    #[arg(long = "fps", value_name = "N", default_value = "30")]
    pub fps: u32,

    /// Serif font file for the left label
    #[arg(long = "serif-font", value_name = "FONT")]
    pub serif_font: Option<PathBuf>,

    /// Sans font file for the right label
    #[arg(long = "sans-font", value_name = "FONT")]
    pub sans_font: Option<PathBuf>,

    /// Enable debug logging to file (default: carousel.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Either headless output was requested
    pub fn is_headless(&self) -> bool {
        self.export.is_some() || self.snapshot.is_some()
    }
}
