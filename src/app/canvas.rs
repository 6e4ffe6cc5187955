//! Central panel: draws the carousel every frame.
//!
//! Idle: the plan is composed at the panel width in points and painted
//! through `EguiSurface`, scroll following the pointer. Recording: the plan
//! is composed at the capture size, rasterized, handed to the capture
//! driver and shown letterboxed in the panel.

use eframe::egui::{self, Color32, ColorImage, Pos2, Rect, TextureOptions};
use log::trace;

use super::CarouselApp;
use crate::core::capture::CaptureStep;
use crate::render::{execute_plan, render_frame, EguiSurface};

impl CarouselApp {
    pub(super) fn render_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let response = ui.allocate_rect(rect, egui::Sense::hover());
            let ppp = ctx.pixels_per_point();
            self.canvas_px = [
                (rect.width() * ppp).round().max(2.0) as u32,
                (rect.height() * ppp).round().max(2.0) as u32,
            ];
            let painter = ui.painter_at(rect);

            match self.capture_size {
                Some(size) if self.engine.is_recording() => self.record_frame(ctx, &painter, rect, size),
                _ => {
                    let pointer_x = response.hover_pos().map(|p| p.x - rect.min.x);
                    let plan = self.engine.frame_plan(&mut self.text, rect.width(), pointer_x);
                    let mut surface = EguiSurface::new(ctx, &painter, rect, &mut self.textures, &mut self.text);
                    execute_plan(&mut surface, &plan);
                }
            }
        });

        self.textures.retain_images(&self.engine.state());
        self.textures.end_frame();
    }

    fn record_frame(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: Rect, [width, height]: [u32; 2]) {
        let plan = self.engine.frame_plan(&mut self.text, width as f32, None);
        let pixels = render_frame(&plan, width, height, &mut self.text);

        let image = ColorImage::from_rgba_unmultiplied([width as usize, height as usize], pixels.as_raw());
        match self.preview.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => self.preview = Some(ctx.load_texture("capture_preview", image, TextureOptions::LINEAR)),
        }

        let step = self.engine.finish_frame(&pixels);
        trace!("Capture step: {:?}", step);

        let bg = plan.background;
        painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(bg[0], bg[1], bg[2], bg[3]));
        if let Some(texture) = &self.preview {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(texture.id(), letterbox(rect, width, height), uv, Color32::WHITE);
        }

        if !matches!(step, CaptureStep::Captured { .. }) {
            self.capture_size = None;
            self.preview = None;
        }
    }
}

/// Largest rect with the frame's aspect ratio centered in `rect`
fn letterbox(rect: Rect, width: u32, height: u32) -> Rect {
    let aspect = width as f32 / height.max(1) as f32;
    let mut size = rect.size();
    if size.x / size.y.max(f32::EPSILON) > aspect {
        size.x = size.y * aspect;
    } else {
        size.y = size.x / aspect;
    }
    Rect::from_center_size(rect.center(), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_keeps_aspect() {
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(400.0, 100.0));
        let fitted = letterbox(rect, 1920, 1080);
        assert!((fitted.height() - 100.0).abs() < 1e-3);
        assert!((fitted.width() - 100.0 * 16.0 / 9.0).abs() < 1e-3);
        assert_eq!(fitted.center(), rect.center());
    }
}
