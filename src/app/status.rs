//! Bottom status line: last notice, item count, recording progress.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::core::events::{Notice, NoticeLevel};

/// How long a notice stays on screen
const NOTICE_TTL: Duration = Duration::from_secs(6);

/// What the status line reports besides the notice
pub struct StatusInfo {
    pub items: usize,
    pub total_width: f32,
    pub style: &'static str,
    /// `(frame, stop_frame)` while recording
    pub recording: Option<(u32, u32)>,
    pub capture_ready: bool,
}

#[derive(Default)]
pub struct StatusBar {
    notice: Option<(Notice, Instant)>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    /// Current notice, if it hasn't expired
    pub fn notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTICE_TTL)
            .map(|(n, _)| n)
    }

    pub fn render(&mut self, ctx: &egui::Context, info: &StatusInfo) {
        if self.notice.as_ref().is_some_and(|(_, at)| at.elapsed() >= NOTICE_TTL) {
            self.notice = None;
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.monospace(format!("{:>3} items", info.items));
                ui.separator();
                ui.monospace(format!("{:>8.1}px", info.total_width));
                ui.separator();
                ui.monospace(info.style);
                ui.separator();

                match info.recording {
                    Some((frame, stop)) => {
                        ui.colored_label(egui::Color32::from_rgb(220, 60, 60), "REC");
                        ui.monospace(format!("{:>4}/{}", frame, stop));
                        ui.add(egui::ProgressBar::new(frame as f32 / stop.max(1) as f32).desired_width(120.0));
                    }
                    None if !info.capture_ready => {
                        ui.weak("video export loading...");
                    }
                    None => {}
                }

                if let Some(notice) = self.notice() {
                    ui.separator();
                    let color = match notice.level {
                        NoticeLevel::Info => ui.visuals().text_color(),
                        NoticeLevel::Warning => ui.visuals().warn_fg_color,
                        NoticeLevel::Error => ui.visuals().error_fg_color,
                    };
                    ui.colored_label(color, &notice.text);
                }
            });
        });
    }
}
