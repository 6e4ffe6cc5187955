//! CPU render surface on an `RgbaImage`.
//!
//! Used for everything that leaves the process as pixels: PNG snapshots and
//! every frame handed to the capture sink. Planes are resampled with a
//! triangle filter and alpha-blended; labels come from `TextRenderer`.

use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::{execute_plan, Camera, RenderSurface};
use crate::core::composer::{DrawPlan, TextAlign};
use crate::core::engine::Engine;
use crate::entities::text::{LabelFont, TextRenderer};
use crate::entities::SourceImage;

pub struct RasterSurface<'a> {
    canvas: RgbaImage,
    camera: Camera,
    text: &'a mut TextRenderer,
}

impl<'a> RasterSurface<'a> {
    pub fn new(width: u32, height: u32, text: &'a mut TextRenderer) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            canvas: RgbaImage::new(width, height),
            camera: Camera::new(Vec2::new(width as f32 / 2.0, height as f32 / 2.0)),
            text,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }
}

impl RenderSurface for RasterSurface<'_> {
    fn clear_background(&mut self, color: [u8; 4]) {
        for px in self.canvas.pixels_mut() {
            *px = Rgba(color);
        }
    }

    fn set_camera(&mut self, zoom: f32, translate_x: f32) {
        self.camera.zoom = zoom;
        self.camera.translate_x = translate_x;
    }

    fn draw_text(&mut self, content: &str, position: Vec2, align: TextAlign, color: [u8; 4], size: f32, font: LabelFont) {
        // Rasterize at screen size so zoomed-out labels stay crisp
        let screen_size = size * self.camera.zoom;
        if screen_size < 1.0 {
            return;
        }
        let glyphs = self.text.rasterize(content, font, screen_size, color);
        let anchor = self.camera.to_screen(position);
        let x = match align {
            TextAlign::Left => anchor.x,
            TextAlign::Right => anchor.x - glyphs.width() as f32,
        };
        let y = anchor.y - glyphs.height() as f32 / 2.0;
        imageops::overlay(&mut self.canvas, &*glyphs, x.round() as i64, y.round() as i64);
    }

    fn draw_textured_plane(&mut self, image: &Arc<SourceImage>, position: Vec2, scale: f32, width: f32, height: f32) {
        let w = (width * scale * self.camera.zoom).round();
        let h = (height * scale * self.camera.zoom).round();
        if w < 1.0 || h < 1.0 {
            return;
        }
        let center = self.camera.to_screen(position);
        let x = (center.x - w / 2.0).round() as i64;
        let y = (center.y - h / 2.0).round() as i64;

        // Skip planes entirely off canvas
        let (cw, ch) = self.canvas.dimensions();
        if x >= cw as i64 || y >= ch as i64 || x + (w as i64) <= 0 || y + (h as i64) <= 0 {
            return;
        }

        let resized = imageops::resize(&**image.pixels(), w as u32, h as u32, FilterType::Triangle);
        imageops::overlay(&mut self.canvas, &resized, x, y);
    }
}

/// Render `plan` into a fresh `width` x `height` image
pub fn render_frame(plan: &DrawPlan, width: u32, height: u32, text: &mut TextRenderer) -> RgbaImage {
    let mut surface = RasterSurface::new(width, height, text);
    execute_plan(&mut surface, plan);
    surface.into_image()
}

/// Write the fully-open layout at the current scroll as a PNG
pub fn save_still(engine: &Engine, text: &mut TextRenderer, width: u32, height: u32, path: &Path) -> image::ImageResult<()> {
    let plan = engine.still_plan(text, width as f32);
    let frame = render_frame(&plan, width, height, text);
    frame.save(path)?;
    log::info!("Snapshot {}x{} written to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_plane() {
        let mut text = TextRenderer::new();
        let mut surface = RasterSurface::new(100, 50, &mut text);
        surface.clear_background([0, 0, 0, 255]);
        surface.set_camera(1.0, 0.0);

        let red = Arc::new(SourceImage::solid(10, 10, [255, 0, 0, 255]));
        surface.draw_textured_plane(&red, Vec2::ZERO, 1.0, 20.0, 20.0);
        let img = surface.into_image();

        assert_eq!(img.get_pixel(50, 25).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(61, 25).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_plane_follows_camera() {
        let mut text = TextRenderer::new();
        let mut surface = RasterSurface::new(200, 100, &mut text);
        surface.clear_background([0, 0, 0, 255]);
        // Zoom 0.5, shift world right by 100 -> world 0 lands at screen 150
        surface.set_camera(0.5, 100.0);
        let white = Arc::new(SourceImage::solid(4, 4, [255, 255, 255, 255]));
        surface.draw_textured_plane(&white, Vec2::ZERO, 1.0, 40.0, 40.0);
        let img = surface.into_image();
        assert_eq!(img.get_pixel(150, 50).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(100, 50).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_tiny_and_offscreen_planes_skipped() {
        let mut text = TextRenderer::new();
        let mut surface = RasterSurface::new(50, 50, &mut text);
        surface.clear_background([1, 2, 3, 255]);
        surface.set_camera(1.0, 0.0);
        let img = Arc::new(SourceImage::solid(4, 4, [255; 4]));
        surface.draw_textured_plane(&img, Vec2::ZERO, 0.0001, 100.0, 100.0);
        surface.draw_textured_plane(&img, Vec2::new(5000.0, 0.0), 1.0, 100.0, 100.0);
        assert!(surface.image().pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_save_still_writes_png() {
        use crate::core::capture::tests::FakeSink;
        use crate::core::composer::{Labels, Theme};
        use crate::core::engine::{Engine, EngineConfig};

        let (sink, _) = FakeSink::ready();
        let config = EngineConfig {
            labels: Labels { left: String::new(), right: String::new() },
            seed: Some(1),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config, Box::new(sink));
        engine.accept(vec![Arc::new(SourceImage::solid(30, 20, [255, 255, 255, 255]))]);

        let path = std::env::temp_dir().join(format!("carousel_still_{}.png", uuid::Uuid::new_v4()));
        let mut text = TextRenderer::new();
        save_still(&engine, &mut text, 320, 180, &path).unwrap();

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (320, 180));
        assert_eq!(written.get_pixel(0, 0).0, Theme::Dark.background());
        assert_eq!(written.get_pixel(160, 90).0, [255, 255, 255, 255]);
        let _ = std::fs::remove_file(&path);
    }
}
