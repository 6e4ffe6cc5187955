//! Decoded source bitmap, immutable once created.
//!
//! Carousel items hold `Arc<SourceImage>`; the pixels are shared, never copied
//! per frame. Identity is a UUID so render surfaces can cache GPU textures.

use std::sync::Arc;

use image::RgbaImage;
use uuid::Uuid;

/// Corner radius applied to carousel images at acceptance time (pixels)
pub const CORNER_RADIUS: u32 = 20;

#[derive(Debug)]
pub struct SourceImage {
    id: Uuid,
    name: String,
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            pixels: Arc::new(pixels),
        }
    }

    /// Single-colour bitmap (placeholders and tests)
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new("solid", RgbaImage::from_pixel(width.max(1), height.max(1), image::Rgba(rgba)))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn natural_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.pixels.height()
    }

    /// naturalWidth / naturalHeight
    pub fn aspect_ratio(&self) -> f32 {
        self.natural_width() as f32 / self.natural_height().max(1) as f32
    }

    pub fn pixels(&self) -> &Arc<RgbaImage> {
        &self.pixels
    }
}

/// Mask out the corners of `img` with a rounded-rectangle alpha.
///
/// Coverage is antialiased over one pixel at the arc edge. Radius is clamped
/// to half the shorter side.
pub fn round_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    let r = radius.min(w / 2).min(h / 2) as f32;
    if r <= 0.0 {
        return;
    }

    for (x, y, px) in img.enumerate_pixels_mut() {
        // Distance from the nearest corner circle center, only inside corner boxes
        let fx = x as f32 + 0.5;
        let fy = y as f32 + 0.5;
        let cx = if fx < r {
            r
        } else if fx > w as f32 - r {
            w as f32 - r
        } else {
            continue;
        };
        let cy = if fy < r {
            r
        } else if fy > h as f32 - r {
            h as f32 - r
        } else {
            continue;
        };

        let dist = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt();
        let coverage = (r - dist + 0.5).clamp(0.0, 1.0);
        px[3] = (px[3] as f32 * coverage).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let img = SourceImage::solid(300, 150, [0, 0, 0, 255]);
        assert_eq!(img.aspect_ratio(), 2.0);
        assert_eq!(img.natural_width(), 300);
        assert_eq!(img.natural_height(), 150);
    }

    #[test]
    fn test_ids_unique() {
        let a = SourceImage::solid(1, 1, [0; 4]);
        let b = SourceImage::solid(1, 1, [0; 4]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_round_corners() {
        let mut img = RgbaImage::from_pixel(100, 60, image::Rgba([255, 255, 255, 255]));
        round_corners(&mut img, CORNER_RADIUS);
        // Corners cleared, center and edge midpoints untouched
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(99, 59)[3], 0);
        assert_eq!(img.get_pixel(50, 30)[3], 255);
        assert_eq!(img.get_pixel(50, 0)[3], 255);
        assert_eq!(img.get_pixel(0, 30)[3], 255);
    }
}
