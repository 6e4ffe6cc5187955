//! Rendering surfaces.
//!
//! A `RenderSurface` knows how to clear, set the camera, draw a label and
//! draw a textured plane. `execute_plan()` feeds it a `DrawPlan` in the
//! fixed order: background clear, camera setup, text draws, image draws.
//!
//! - `raster` - CPU canvas (`image` crate): snapshots, video frames
//! - `egui_surface` - interactive window via the egui painter

pub mod egui_surface;
pub mod raster;

use std::sync::Arc;

use glam::Vec2;

use crate::core::composer::{DrawCommand, DrawPlan, TextAlign};
use crate::entities::text::LabelFont;
use crate::entities::SourceImage;

pub use egui_surface::{EguiSurface, TextureCache};
pub use raster::{render_frame, save_still, RasterSurface};

pub trait RenderSurface {
    fn clear_background(&mut self, color: [u8; 4]);

    /// World -> screen: translate by `translate_x`, then scale by `zoom`
    /// about the surface center
    fn set_camera(&mut self, zoom: f32, translate_x: f32);

    fn draw_text(
        &mut self,
        content: &str,
        position: Vec2,
        align: TextAlign,
        color: [u8; 4],
        size: f32,
        font: LabelFont,
    );

    /// Plane centered on `position`, `width * scale` by `height * scale` world units
    fn draw_textured_plane(&mut self, image: &Arc<SourceImage>, position: Vec2, scale: f32, width: f32, height: f32);
}

/// Issue every command of `plan`: clear, camera, texts, planes.
pub fn execute_plan(surface: &mut dyn RenderSurface, plan: &DrawPlan) {
    surface.clear_background(plan.background);
    surface.set_camera(plan.zoom, plan.translate_x);

    for cmd in plan.texts() {
        if let DrawCommand::Text { content, position, align, font, color, size } = cmd {
            if !content.is_empty() {
                surface.draw_text(content, *position, *align, *color, *size, *font);
            }
        }
    }
    for cmd in plan.planes() {
        if let DrawCommand::Plane { image, position, scale, width, height } = cmd {
            surface.draw_textured_plane(image, *position, *scale, *width, *height);
        }
    }
}

/// Shared world -> screen mapping for surfaces of a given size
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub zoom: f32,
    pub translate_x: f32,
    pub center: Vec2,
}

impl Camera {
    pub fn new(center: Vec2) -> Self {
        Self { zoom: 1.0, translate_x: 0.0, center }
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        self.center + (world + Vec2::new(self.translate_x, 0.0)) * self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::composer::{FrameComposer, Labels, TextMetrics, Theme};
    use crate::core::layout::{CarouselEntry, CarouselState, SizeAssignment};
    use crate::core::timeline::{Timeline, TimelineConfig, TimingStyle};

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<&'static str>,
    }

    impl RenderSurface for RecordingSurface {
        fn clear_background(&mut self, _color: [u8; 4]) {
            self.calls.push("clear");
        }
        fn set_camera(&mut self, _zoom: f32, _translate_x: f32) {
            self.calls.push("camera");
        }
        fn draw_text(&mut self, _c: &str, _p: Vec2, _a: TextAlign, _col: [u8; 4], _s: f32, _f: LabelFont) {
            self.calls.push("text");
        }
        fn draw_textured_plane(&mut self, _i: &Arc<SourceImage>, _p: Vec2, _s: f32, _w: f32, _h: f32) {
            self.calls.push("plane");
        }
    }

    #[test]
    fn test_execute_order() {
        let entries: Vec<CarouselEntry> = (0..2u8)
            .map(|i| {
                CarouselEntry::new(
                    Arc::new(SourceImage::solid(4, 4, [255; 4])),
                    SizeAssignment { height: 200.0, bucket: i },
                )
            })
            .collect();
        let state = CarouselState::rebuild(&entries, 20.0);
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        let output = timeline.evaluate_manual(state.len(), 0.0);
        let plan = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Dark).compose(
            &state,
            &output,
            &Labels::default(),
            TextMetrics { left_width: 100.0, right_width: 100.0 },
            1000.0,
        );

        let mut surface = RecordingSurface::default();
        execute_plan(&mut surface, &plan);
        assert_eq!(surface.calls, vec!["clear", "camera", "text", "text", "plane", "plane"]);
    }

    #[test]
    fn test_camera_mapping() {
        let mut cam = Camera::new(Vec2::new(500.0, 300.0));
        cam.zoom = 0.5;
        cam.translate_x = -100.0;
        assert_eq!(cam.to_screen(Vec2::new(100.0, 0.0)), Vec2::new(500.0, 300.0));
        assert_eq!(cam.to_screen(Vec2::new(300.0, 20.0)), Vec2::new(600.0, 310.0));
    }
}
