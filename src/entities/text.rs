//! Label text: measurement and rasterization.
//!
//! Uses cosmic-text for shaping (HarfBuzz-quality), so the widths fed to the
//! frame composer are the same ones the glyphs are drawn with, on screen and
//! in captured video alike.
//!
//! The left label uses a serif face, the right label a sans face. Custom font
//! files can replace either.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cosmic_text::{Attrs as TextAttrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::RgbaImage;
use log::{debug, warn};

/// Default label size in pixels
pub const TEXT_SIZE: f32 = 40.0;

/// Rasterized labels kept before the cache is flushed. Zoom animates
/// during recording, so nearly every frame asks for a new size.
const MAX_CACHED_LABELS: usize = 64;

/// Which face a label is set in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelFont {
    Serif,
    Sans,
}

/// Width source for the composer. Implemented by `TextRenderer` and by fixed
/// metrics in tests.
pub trait TextMeasure {
    fn text_width(&mut self, text: &str, font: LabelFont, size: f32) -> f32;
}

/// Fixed per-font widths (tests, headless dry runs)
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedMetrics {
    pub serif_width: f32,
    pub sans_width: f32,
}

impl TextMeasure for FixedMetrics {
    fn text_width(&mut self, text: &str, font: LabelFont, _size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        match font {
            LabelFont::Serif => self.serif_width,
            LabelFont::Sans => self.sans_width,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GlyphKey {
    text: String,
    font: LabelFont,
    size_bits: u32,
    color: [u8; 4],
}

/// cosmic-text backed renderer with a rasterized-label cache.
pub struct TextRenderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    serif_family: Option<String>,
    sans_family: Option<String>,
    cache: HashMap<GlyphKey, Arc<RgbaImage>>,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer {
    /// Renderer using system serif/sans families
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            serif_family: None,
            sans_family: None,
            cache: HashMap::new(),
        }
    }

    /// Load a font file for `font`. On failure the system family stays in use.
    pub fn load_font(&mut self, font: LabelFont, path: &Path) {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to read font {}: {}", path.display(), e);
                return;
            }
        };
        let db = self.font_system.db_mut();
        let before = db.len();
        db.load_font_data(data);
        let family = db
            .faces()
            .skip(before)
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()));

        match family {
            Some(name) => {
                debug!("Loaded font '{}' from {} for {:?}", name, path.display(), font);
                match font {
                    LabelFont::Serif => self.serif_family = Some(name),
                    LabelFont::Sans => self.sans_family = Some(name),
                }
                self.cache.clear();
            }
            None => warn!("No usable face in {}", path.display()),
        }
    }

    fn layout(&mut self, text: &str, font: LabelFont, size: f32) -> Buffer {
        let line_height = size * 1.2;
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, line_height));
        buffer.set_size(&mut self.font_system, None, None);

        let custom = match font {
            LabelFont::Serif => self.serif_family.as_deref(),
            LabelFont::Sans => self.sans_family.as_deref(),
        };
        let family = match (custom, font) {
            (Some(name), _) => Family::Name(name),
            (None, LabelFont::Serif) => Family::Serif,
            (None, LabelFont::Sans) => Family::SansSerif,
        };
        let attrs = TextAttrs::new().family(family);
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Rasterize a single-line label. Image height is one line (size × 1.2);
    /// the label's vertical center is the image center.
    pub fn rasterize(&mut self, text: &str, font: LabelFont, size: f32, color: [u8; 4]) -> Arc<RgbaImage> {
        let key = GlyphKey {
            text: text.to_string(),
            font,
            size_bits: size.to_bits(),
            color,
        };
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached);
        }

        let buffer = self.layout(text, font, size);
        let width = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max)
            .ceil()
            .max(1.0) as u32;
        let height = (size * 1.2).ceil().max(1.0) as u32;

        let mut img = RgbaImage::new(width, height);
        let text_color = Color::rgba(color[0], color[1], color[2], color[3]);
        let mut buffer = buffer;
        buffer.draw(&mut self.font_system, &mut self.swash_cache, text_color, |x, y, w, h, c| {
            if c.a() == 0 {
                return;
            }
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    let px = x + dx;
                    let py = y + dy;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let dst = img.get_pixel_mut(px as u32, py as u32);
                    blend_over(&mut dst.0, [c.r(), c.g(), c.b(), c.a()]);
                }
            }
        });

        let img = Arc::new(img);
        if self.cache.len() >= MAX_CACHED_LABELS {
            self.cache.clear();
        }
        self.cache.insert(key, Arc::clone(&img));
        img
    }
}

impl TextMeasure for TextRenderer {
    fn text_width(&mut self, text: &str, font: LabelFont, size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let buffer = self.layout(text, font, size);
        buffer.layout_runs().map(|run| run.line_w).fold(0.0, f32::max)
    }
}

/// Straight-alpha "over" blend of `src` onto `dst`
pub fn blend_over(dst: &mut [u8; 4], src: [u8; 4]) {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = [0, 0, 0, 0];
        return;
    }
    for i in 0..3 {
        let s = src[i] as f32 / 255.0;
        let d = dst[i] as f32 / 255.0;
        let out = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst[i] = (out * 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_metrics() {
        let mut m = FixedMetrics { serif_width: 120.0, sans_width: 300.0 };
        assert_eq!(m.text_width("Coffee", LabelFont::Serif, TEXT_SIZE), 120.0);
        assert_eq!(m.text_width("by", LabelFont::Sans, TEXT_SIZE), 300.0);
        assert_eq!(m.text_width("", LabelFont::Sans, TEXT_SIZE), 0.0);
    }

    #[test]
    fn test_blend_over() {
        let mut dst = [0, 0, 0, 255];
        blend_over(&mut dst, [255, 255, 255, 255]);
        assert_eq!(dst, [255, 255, 255, 255]);

        let mut dst = [0, 0, 0, 0];
        blend_over(&mut dst, [200, 100, 50, 0]);
        assert_eq!(dst, [0, 0, 0, 0]);

        let mut dst = [0, 0, 0, 255];
        blend_over(&mut dst, [255, 255, 255, 128]);
        assert!(dst[0] > 120 && dst[0] < 135);
        assert_eq!(dst[3], 255);
    }

    #[test]
    fn test_empty_text_zero_width() {
        let mut renderer = TextRenderer::new();
        assert_eq!(renderer.text_width("", LabelFont::Serif, TEXT_SIZE), 0.0);
    }
}
