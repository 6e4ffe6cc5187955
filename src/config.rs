//! Application paths and persisted UI preferences.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::core::composer::{Labels, Theme};
use crate::core::engine::{EngineConfig, DEFAULT_PADDING};
use crate::core::timeline::{TimelineConfig, TimingStyle};

/// Environment override for the config directory
pub const CONFIG_DIR_ENV: &str = "CAROUSEL_CONFIG_DIR";

/// Directory name under the platform config/data dirs
const APP_DIR: &str = "carousel-studio";

/// Files whose presence in the working directory makes it the config dir
const LOCAL_FILES: [&str; 2] = ["carousel.json", "carousel.log"];

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (CAROUSEL_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }

    /// Get the configuration directory
    ///
    /// Priority:
    /// 1. CLI --config-dir argument
    /// 2. CAROUSEL_CONFIG_DIR environment variable
    /// 3. Local folder IF carousel.json or carousel.log exist there
    /// 4. Platform-specific config directory from dirs-next
    pub fn config_dir(&self) -> PathBuf {
        self.resolve(dirs_next::config_dir)
    }

    /// Same priority as `config_dir()`, platform data dir as default
    pub fn data_dir(&self) -> PathBuf {
        self.resolve(dirs_next::data_dir)
    }

    fn resolve(&self, platform: fn() -> Option<PathBuf>) -> PathBuf {
        if let Some(dir) = &self.config_dir {
            return dir.clone();
        }
        if let Ok(current_dir) = std::env::current_dir() {
            if has_local_files(&current_dir) {
                return current_dir;
            }
        }
        platform()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir().join(name)
    }

    /// Path to a data file (logs, exports without explicit path)
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir().join(name)
    }

    /// Create config and data directories if missing
    pub fn ensure_dirs(&self) -> Result<()> {
        let config_dir = self.config_dir();
        let data_dir = self.data_dir();

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
        if data_dir != config_dir {
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        }
        Ok(())
    }
}

fn has_local_files(dir: &Path) -> bool {
    LOCAL_FILES.iter().any(|f| dir.join(f).exists())
}

/// UI preferences persisted through eframe storage.
///
/// Carousel content is never stored, only how the window was set up.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct AppSettings {
    pub dark_mode: bool,
    pub labels: Labels,
    pub style: TimingStyle,
    pub padding: f32,
    /// Last video export target
    pub export_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            labels: Labels::default(),
            style: TimingStyle::HoldAndReverse,
            padding: DEFAULT_PADDING,
            export_path: None,
        }
    }
}

impl AppSettings {
    pub fn theme(&self) -> Theme {
        if self.dark_mode { Theme::Dark } else { Theme::Light }
    }

    /// Command-line values override what was persisted
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(left) = &args.left {
            self.labels.left = left.clone();
        }
        if let Some(right) = &args.right {
            self.labels.right = right.clone();
        }
        if let Some(style) = args.style {
            self.style = style.into();
        }
        if let Some(padding) = args.padding {
            self.padding = padding.max(0.0);
        }
        if args.light {
            self.dark_mode = false;
        }
    }

    /// Engine parameters for these settings
    pub fn engine_config(&self, seed: Option<u64>, delay: Option<u32>) -> EngineConfig {
        let mut timeline = TimelineConfig::preset(self.style);
        if let Some(delay) = delay {
            timeline.delay = delay;
        }
        EngineConfig {
            timeline,
            padding: self.padding.max(0.0),
            labels: self.labels.clone(),
            theme: self.theme(),
            seed,
        }
    }
}
