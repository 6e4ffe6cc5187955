//! Interactive render surface backed by the egui painter.
//!
//! Source images are uploaded once per `Uuid` and reused. Label textures are
//! keyed by content, face, size and colour; labels not drawn during a frame
//! are dropped at `end_frame()`, so editing a label doesn't pile up textures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use eframe::egui::{self, Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions, Vec2 as EVec2};
use glam::Vec2;
use image::RgbaImage;
use log::trace;
use uuid::Uuid;

use super::{Camera, RenderSurface};
use crate::core::composer::TextAlign;
use crate::core::layout::CarouselState;
use crate::entities::text::{LabelFont, TextRenderer};
use crate::entities::SourceImage;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LabelKey {
    content: String,
    font: LabelFont,
    size_bits: u32,
    color: [u8; 4],
}

/// Textures kept alive across frames
#[derive(Default)]
pub struct TextureCache {
    planes: HashMap<Uuid, TextureHandle>,
    labels: HashMap<LabelKey, TextureHandle>,
    labels_used: HashSet<LabelKey>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop textures of images no longer in the carousel
    pub fn retain_images(&mut self, state: &CarouselState) {
        let live: HashSet<Uuid> = state.items.iter().map(|i| i.image.id()).collect();
        let before = self.planes.len();
        self.planes.retain(|id, _| live.contains(id));
        if self.planes.len() != before {
            trace!("Released {} image textures", before - self.planes.len());
        }
    }

    /// Drop label textures not drawn since the last call
    pub fn end_frame(&mut self) {
        let used = std::mem::take(&mut self.labels_used);
        self.labels.retain(|k, _| used.contains(k));
    }

    fn plane(&mut self, ctx: &egui::Context, image: &SourceImage) -> egui::TextureId {
        self.planes
            .entry(image.id())
            .or_insert_with(|| ctx.load_texture(image.name(), to_color_image(image.pixels()), TextureOptions::LINEAR))
            .id()
    }

    fn label(&mut self, ctx: &egui::Context, key: LabelKey, pixels: impl FnOnce() -> Arc<RgbaImage>) -> (egui::TextureId, EVec2) {
        self.labels_used.insert(key.clone());
        let handle = self
            .labels
            .entry(key)
            .or_insert_with(|| ctx.load_texture("label", to_color_image(&pixels()), TextureOptions::LINEAR));
        let [w, h] = handle.size();
        (handle.id(), EVec2::new(w as f32, h as f32))
    }
}

fn to_color_image(img: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied([img.width() as usize, img.height() as usize], img.as_raw())
}

pub struct EguiSurface<'a> {
    ctx: &'a egui::Context,
    painter: &'a egui::Painter,
    rect: Rect,
    camera: Camera,
    cache: &'a mut TextureCache,
    text: &'a mut TextRenderer,
}

impl<'a> EguiSurface<'a> {
    pub fn new(
        ctx: &'a egui::Context,
        painter: &'a egui::Painter,
        rect: Rect,
        cache: &'a mut TextureCache,
        text: &'a mut TextRenderer,
    ) -> Self {
        let center = rect.center();
        Self {
            ctx,
            painter,
            rect,
            camera: Camera::new(Vec2::new(center.x, center.y)),
            cache,
            text,
        }
    }
}

fn color32(c: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

impl RenderSurface for EguiSurface<'_> {
    fn clear_background(&mut self, color: [u8; 4]) {
        self.painter.rect_filled(self.rect, 0.0, color32(color));
    }

    fn set_camera(&mut self, zoom: f32, translate_x: f32) {
        self.camera.zoom = zoom;
        self.camera.translate_x = translate_x;
    }

    fn draw_text(&mut self, content: &str, position: Vec2, align: TextAlign, color: [u8; 4], size: f32, font: LabelFont) {
        let ppp = self.ctx.pixels_per_point();
        let pixel_size = size * self.camera.zoom * ppp;
        if pixel_size < 1.0 {
            return;
        }
        let key = LabelKey {
            content: content.to_string(),
            font,
            size_bits: pixel_size.to_bits(),
            color,
        };
        let text = &mut *self.text;
        let (id, pixels) = self
            .cache
            .label(self.ctx, key, || text.rasterize(content, font, pixel_size, color));
        let size_pts = pixels / ppp;

        let anchor = self.camera.to_screen(position);
        let min_x = match align {
            TextAlign::Left => anchor.x,
            TextAlign::Right => anchor.x - size_pts.x,
        };
        let rect = Rect::from_min_size(Pos2::new(min_x, anchor.y - size_pts.y / 2.0), size_pts);
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        self.painter.image(id, rect, uv, Color32::WHITE);
    }

    fn draw_textured_plane(&mut self, image: &Arc<SourceImage>, position: Vec2, scale: f32, width: f32, height: f32) {
        let size = EVec2::new(width, height) * scale * self.camera.zoom;
        if size.x < 0.5 || size.y < 0.5 {
            return;
        }
        let center = self.camera.to_screen(position);
        let rect = Rect::from_center_size(Pos2::new(center.x, center.y), size);
        if !rect.intersects(self.rect) {
            return;
        }
        let id = self.cache.plane(self.ctx, image);
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        self.painter.image(id, rect, uv, Color32::WHITE);
    }
}
