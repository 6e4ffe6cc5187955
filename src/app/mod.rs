//! Application module - CarouselApp and its frame loop.
//!
//! - `toolbar` - label fields, upload/save/reset buttons, style and padding
//! - `canvas` - central panel: interactive preview or recording
//! - `status` - bottom status line with the latest notice

mod canvas;
mod status;
mod toolbar;

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;
use log::{debug, info};

use crate::config::AppSettings;
use crate::core::capture::{CaptureConfig, RecordError, DEFAULT_FPS};
use crate::core::engine::Engine;
use crate::core::events::{CarouselEvent, Notice};
use crate::core::workers::Workers;
use crate::dialogs::encode::{ExportSink, FfmpegStatus};
use crate::entities::text::{LabelFont, TextRenderer};
use crate::entities::ImageStore;
use crate::render::{save_still, TextureCache};
use crate::utils::media;
use status::{StatusBar, StatusInfo};
use toolbar::{ToolbarAction, ToolbarState};

/// Default file name offered by "Save Image"
pub const SNAPSHOT_FILE: &str = "layout_export.png";
/// Default file name offered by "Save Video"
pub const VIDEO_FILE: &str = "carousel.mp4";

/// Startup inputs that are not persisted
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub files: Vec<PathBuf>,
    pub seed: Option<u64>,
    pub delay: Option<u32>,
    pub fps: Option<u32>,
    pub serif_font: Option<PathBuf>,
    pub sans_font: Option<PathBuf>,
}

pub struct CarouselApp {
    settings: AppSettings,
    engine: Engine,
    store: ImageStore,
    text: TextRenderer,
    textures: TextureCache,
    status: StatusBar,
    fps: u32,
    /// Central panel size in physical pixels, refreshed every frame
    canvas_px: [u32; 2],
    /// Frame size of the running recording
    capture_size: Option<[u32; 2]>,
    preview: Option<egui::TextureHandle>,
    applied_dark: Option<bool>,
}

impl CarouselApp {
    pub fn new(settings: AppSettings, startup: StartupOptions) -> Self {
        let ffmpeg = FfmpegStatus::spawn_init();
        let engine = Engine::new(
            settings.engine_config(startup.seed, startup.delay),
            Box::new(ExportSink::new(ffmpeg)),
        );

        let workers = Arc::new(Workers::new(num_cpus::get().saturating_sub(1).max(1)));
        let store = ImageStore::new(workers);

        let mut text = TextRenderer::new();
        if let Some(path) = &startup.serif_font {
            text.load_font(LabelFont::Serif, path);
        }
        if let Some(path) = &startup.sans_font {
            text.load_font(LabelFont::Sans, path);
        }

        for path in startup.files {
            store.request_path(path);
        }

        Self {
            settings,
            engine,
            store,
            text,
            textures: TextureCache::new(),
            status: StatusBar::new(),
            fps: startup.fps.unwrap_or(DEFAULT_FPS),
            canvas_px: [1280, 720],
            capture_size: None,
            preview: None,
            applied_dark: None,
        }
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        if self.applied_dark == Some(self.settings.dark_mode) {
            return;
        }
        ctx.set_visuals(if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        self.applied_dark = Some(self.settings.dark_mode);
    }

    /// Queue dropped files (paths on desktop, bytes on web/blob drops)
    fn handle_dropped(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        if self.engine.is_recording() {
            self.status.push(Notice::warning("Can't add images while recording"));
            return;
        }
        for file in dropped {
            if let Some(path) = file.path {
                debug!("Dropped {}", path.display());
                self.store.request_path(path);
            } else if let Some(bytes) = file.bytes {
                debug!("Dropped blob {} ({} bytes)", file.name, bytes.len());
                self.store.request_bytes(file.name, bytes);
            }
        }
    }

    fn poll_loader(&mut self) {
        let (images, errors) = self.store.poll();
        self.engine.accept(images);
        for e in errors {
            self.engine.events().notify(Notice::warning(e.to_string()));
        }
    }

    fn drain_events(&mut self) {
        for event in self.engine.events().poll() {
            match event {
                CarouselEvent::Notice(notice) => self.status.push(notice),
                CarouselEvent::RecordingFinished { frames, output } => {
                    info!("Recording finished: {} frames -> {}", frames, output.display());
                }
                CarouselEvent::SnapshotSaved(path) => {
                    self.status.push(Notice::info(format!("Saved {}", path.display())));
                }
                CarouselEvent::CarouselReset => {
                    self.capture_size = None;
                    self.preview = None;
                }
                CarouselEvent::ImagesAccepted { .. }
                | CarouselEvent::LayoutRebuilt { .. }
                | CarouselEvent::RecordingStarted { .. } => {}
            }
        }
    }

    fn apply(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Upload => self.upload(),
            ToolbarAction::SaveImage => self.save_image(),
            ToolbarAction::SaveVideo => self.save_video(),
            ToolbarAction::StopRecording => {
                // Saves the frames captured so far; the notice comes through the bus
                self.engine.stop_recording();
                self.capture_size = None;
                self.preview = None;
            }
            ToolbarAction::Reset => self.reset(),
            ToolbarAction::ToggleTheme => {
                self.settings.dark_mode = !self.settings.dark_mode;
                self.engine.set_theme(self.settings.theme());
            }
            ToolbarAction::SetLabels(labels) => {
                self.settings.labels = labels.clone();
                self.engine.set_labels(labels);
            }
            ToolbarAction::SetStyle(style) => {
                self.engine.set_style(style);
                self.settings.style = self.engine.timeline().config().style;
            }
            ToolbarAction::SetPadding(padding) => {
                self.engine.set_padding(padding);
                self.settings.padding = self.engine.padding();
            }
        }
    }

    /// Forget every item and every pending decode
    fn reset(&mut self) {
        self.store.invalidate();
        self.engine.reset();
    }

    /// Picking new files replaces the collection
    fn upload(&mut self) {
        let Some(files) = rfd::FileDialog::new()
            .add_filter("Images", media::IMAGE_EXTS)
            .add_filter("All Files", &["*"])
            .pick_files()
        else {
            return;
        };
        if files.is_empty() {
            return;
        }
        self.reset();
        for path in files {
            self.store.request_path(path);
        }
    }

    fn save_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(SNAPSHOT_FILE)
            .save_file()
        else {
            return;
        };
        let [width, height] = self.canvas_px;
        match save_still(&self.engine, &mut self.text, width, height, &path) {
            Ok(()) => self.engine.events().emit(CarouselEvent::SnapshotSaved(path)),
            Err(e) => self
                .engine
                .events()
                .notify(Notice::error(format!("Failed to save {}: {}", path.display(), e))),
        }
    }

    fn save_video(&mut self) {
        // Precondition failures are reported before asking for a path
        if self.engine.state().is_empty() {
            self.status.push(Notice::warning(RecordError::NoItems.to_string()));
            return;
        }
        if !self.engine.capture_available() {
            self.status.push(Notice::warning(RecordError::CaptureNotReady.to_string()));
            return;
        }

        let mut dialog = rfd::FileDialog::new()
            .add_filter("MP4 video", &["mp4"])
            .add_filter("PNG frames", &["png"])
            .set_file_name(VIDEO_FILE);
        if let Some(dir) = self.settings.export_path.as_ref().and_then(|p| p.parent()) {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        // Even dimensions for YUV 4:2:0
        let [w, h] = self.canvas_px;
        let (width, height) = ((w & !1).max(2), (h & !1).max(2));
        let config = CaptureConfig {
            fps: self.fps,
            ..CaptureConfig::new(width, height, path.clone())
        };
        if self.engine.start_recording(&config).is_ok() {
            self.capture_size = Some([width, height]);
            self.settings.export_path = Some(path);
        }
    }

    fn status_info(&self) -> StatusInfo {
        let state = self.engine.state();
        let stop = self.engine.timeline().config().stop_frame();
        StatusInfo {
            items: state.len(),
            total_width: state.total_width,
            style: self.engine.timeline().config().style.as_str(),
            recording: self.engine.recording_frame().map(|f| (f, stop)),
            capture_ready: self.engine.capture_available(),
        }
    }
}

impl eframe::App for CarouselApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);
        self.handle_dropped(ctx);
        self.poll_loader();

        let toolbar_state = ToolbarState {
            labels: self.engine.labels(),
            style: self.engine.timeline().config().style,
            padding: self.engine.padding(),
            dark_mode: self.settings.dark_mode,
            recording: self.engine.is_recording(),
            has_items: !self.engine.state().is_empty(),
        };
        let actions = toolbar::render(ctx, &toolbar_state);
        for action in actions {
            self.apply(action);
        }

        self.drain_events();
        let info = self.status_info();
        self.status.render(ctx, &info);

        self.render_canvas(ctx);
        self.drain_events();

        // Continuous animation: the scroll and the recording advance per frame
        ctx.request_repaint();
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(json) = serde_json::to_string(&self.settings) {
            storage.set_string(eframe::APP_KEY, json);
            debug!(
                "Settings saved: dark={}, style={}, padding={}",
                self.settings.dark_mode,
                self.settings.style.as_str(),
                self.settings.padding
            );
        }
    }
}
