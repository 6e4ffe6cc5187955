use carousel_studio::app::{CarouselApp, StartupOptions};
use carousel_studio::cli::Args;
use carousel_studio::config::{AppSettings, PathConfig};
use carousel_studio::core::capture::{CaptureConfig, CaptureStep};
use carousel_studio::core::engine::Engine;
use carousel_studio::dialogs::encode::{ExportSink, FfmpegStatus};
use carousel_studio::entities::text::{LabelFont, TextRenderer};
use carousel_studio::entities::{Loader, SourceImage};
use carousel_studio::render::{render_frame, save_still};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use eframe::egui;
use log::{debug, info, trace, warn};
use std::sync::Arc;

const CONFIG_FILE: &str = "carousel.json";
const LOG_FILE: &str = "carousel.log";

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    if std::env::args_os().len() == 1 {
        use clap::CommandFactory;
        let _ = Args::command().print_help();
        println!("\n");
    }

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = path_config.ensure_dirs() {
        eprintln!("Warning: Failed to create application directories: {:#}", e);
    }

    init_logging(&args, &path_config)?;

    info!("Carousel Studio {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);
    info!("Config path: {}", path_config.config_file(CONFIG_FILE).display());

    if args.is_headless() {
        return run_headless(&args);
    }
    run_gui(args, path_config)
}

/// 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| path_config.data_file(LOG_FILE));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("cosmic_text", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("cosmic_text", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn load_fonts(text: &mut TextRenderer, args: &Args) {
    if let Some(path) = &args.serif_font {
        text.load_font(LabelFont::Serif, path);
    }
    if let Some(path) = &args.sans_font {
        text.load_font(LabelFont::Sans, path);
    }
}

/// Decode inputs in argument order, skipping non-images
fn load_inputs(args: &Args) -> Vec<Arc<SourceImage>> {
    let mut images = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match Loader::load_path(path) {
            Ok(img) => images.push(Arc::new(img)),
            Err(e) if e.is_filtered() => debug!("Skipping {}: {}", path.display(), e),
            Err(e) => warn!("{}", e),
        }
    }
    images
}

fn run_headless(args: &Args) -> Result<()> {
    let mut settings = AppSettings::default();
    settings.apply_args(args);

    let ffmpeg = FfmpegStatus::init_blocking();
    let mut engine = Engine::new(
        settings.engine_config(args.seed, args.delay),
        Box::new(ExportSink::new(ffmpeg)),
    );
    let mut text = TextRenderer::new();
    load_fonts(&mut text, args);

    let images = load_inputs(args);
    if images.is_empty() {
        bail!("No readable images among {} input(s)", args.files.len());
    }
    engine.accept(images);

    if let Some(path) = &args.snapshot {
        save_still(&engine, &mut text, args.width, args.height, path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        println!("Snapshot saved to {}", path.display());
    }

    if let Some(path) = &args.export {
        let config = CaptureConfig {
            fps: args.fps,
            ..CaptureConfig::new(args.width, args.height, path.clone())
        };
        engine
            .start_recording(&config)
            .with_context(|| format!("Failed to start export to {}", path.display()))?;

        loop {
            let plan = engine.frame_plan(&mut text, args.width as f32, None);
            let frame = render_frame(&plan, args.width, args.height, &mut text);
            match engine.finish_frame(&frame) {
                CaptureStep::Captured { frame } => trace!("Captured frame {}", frame),
                CaptureStep::Finished { frames, output } => {
                    println!("Exported {} frames to {}", frames, output.display());
                    break;
                }
                CaptureStep::Failed(e) => return Err(e).context("Export failed"),
                CaptureStep::Idle => bail!("Recording stopped before the last frame"),
            }
        }
    }
    Ok(())
}

fn run_gui(args: Args, path_config: PathConfig) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Carousel Studio v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1280.0, 720.0])
            .with_resizable(true)
            .with_drag_and_drop(true),
        persist_window: true,
        persistence_path: Some(path_config.config_file(CONFIG_FILE)),
        ..Default::default()
    };

    let startup = StartupOptions {
        files: args.files.clone(),
        seed: args.seed,
        delay: args.delay,
        fps: Some(args.fps),
        serif_font: args.serif_font.clone(),
        sans_font: args.sans_font.clone(),
    };

    info!("Starting GUI with window persistence and drag-and-drop enabled");

    eframe::run_native(
        "Carousel Studio",
        native_options,
        Box::new(move |cc| {
            let mut settings: AppSettings = cc
                .storage
                .and_then(|storage| storage.get_string(eframe::APP_KEY))
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or_else(|| {
                    info!("No persisted settings found, using defaults");
                    AppSettings::default()
                });
            settings.apply_args(&args);
            Ok(Box::new(CarouselApp::new(settings, startup)))
        }),
    )
    .map_err(|e| anyhow!("eframe error: {}", e))
}
