//! Carousel layout builder.
//!
//! Two-phase contract:
//! 1. `SizeAssigner::assign()` picks a size bucket + height exactly once,
//!    when an image is accepted. The result lives on `CarouselEntry` and is
//!    never re-derived.
//! 2. `CarouselState::rebuild()` lays entries out left-to-right around the
//!    origin. It owns no randomness, so rebuilding is idempotent.
//!
//! # Buckets
//!
//! Three height ranges with dead space between them (280..320, 440..480),
//! so two adjacent new items always differ visibly in size.

use std::sync::Arc;

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::entities::SourceImage;

/// One of the three disjoint height ranges
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeBucket {
    pub id: u8,
    pub min: f32,
    pub max: f32,
}

pub const SIZE_BUCKETS: [SizeBucket; 3] = [
    SizeBucket { id: 0, min: 150.0, max: 280.0 }, // small
    SizeBucket { id: 1, min: 320.0, max: 440.0 }, // medium
    SizeBucket { id: 2, min: 480.0, max: 620.0 }, // large
];

/// Height + bucket chosen at acceptance time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeAssignment {
    pub height: f32,
    pub bucket: u8,
}

/// Picks size buckets so consecutive assignments never repeat a bucket.
#[derive(Debug)]
pub struct SizeAssigner {
    rng: StdRng,
}

impl SizeAssigner {
    /// Seeded assigner (reproducible); `None` seeds from the OS
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Choose a bucket different from `previous`, then a height inside it.
    pub fn assign(&mut self, previous: Option<u8>) -> SizeAssignment {
        let available: Vec<&SizeBucket> = SIZE_BUCKETS
            .iter()
            .filter(|b| Some(b.id) != previous)
            .collect();
        let bucket = available[self.rng.random_range(0..available.len())];
        let height = self.rng.random_range(bucket.min..=bucket.max);
        trace!("Assigned bucket {} height {:.1} (previous {:?})", bucket.id, height, previous);
        SizeAssignment {
            height,
            bucket: bucket.id,
        }
    }
}

/// Accepted image with its fixed size assignment.
#[derive(Clone, Debug)]
pub struct CarouselEntry {
    pub image: Arc<SourceImage>,
    pub size: SizeAssignment,
}

impl CarouselEntry {
    pub fn new(image: Arc<SourceImage>, size: SizeAssignment) -> Self {
        Self { image, size }
    }
}

/// Laid-out carousel item (rest pose)
#[derive(Clone, Debug)]
pub struct CarouselItem {
    pub image: Arc<SourceImage>,
    pub assigned_height: f32,
    /// assigned_height × natural aspect ratio
    pub width: f32,
    /// Center X at rest, relative to the carousel center
    pub rest_offset_x: f32,
    pub size_bucket: u8,
}

/// Immutable layout snapshot. Replaced wholesale on every rebuild.
#[derive(Clone, Debug, Default)]
pub struct CarouselState {
    pub items: Vec<CarouselItem>,
    pub padding: f32,
    pub total_width: f32,
}

impl CarouselState {
    /// Lay out `entries` in display order with `padding` between neighbours.
    pub fn rebuild(entries: &[CarouselEntry], padding: f32) -> Self {
        if entries.is_empty() {
            return Self {
                items: Vec::new(),
                padding,
                total_width: 0.0,
            };
        }

        let widths: Vec<f32> = entries
            .iter()
            .map(|e| e.size.height * e.image.aspect_ratio())
            .collect();
        let total_width =
            widths.iter().sum::<f32>() + (entries.len() - 1) as f32 * padding;

        let mut running_x = -total_width / 2.0;
        let items = entries
            .iter()
            .zip(widths)
            .map(|(entry, width)| {
                let item = CarouselItem {
                    image: Arc::clone(&entry.image),
                    assigned_height: entry.size.height,
                    width,
                    rest_offset_x: running_x + width / 2.0,
                    size_bucket: entry.size.bucket,
                };
                running_x += width + padding;
                item
            })
            .collect();

        Self {
            items,
            padding,
            total_width,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Arc<SourceImage> {
        Arc::new(SourceImage::solid(10, 10, [255, 0, 0, 255]))
    }

    fn entries(heights: &[(f32, u8)]) -> Vec<CarouselEntry> {
        heights
            .iter()
            .map(|&(height, bucket)| CarouselEntry::new(square(), SizeAssignment { height, bucket }))
            .collect()
    }

    #[test]
    fn test_empty_layout() {
        let state = CarouselState::rebuild(&[], 20.0);
        assert!(state.is_empty());
        assert_eq!(state.total_width, 0.0);
    }

    #[test]
    fn test_three_bucket_layout() {
        let state = CarouselState::rebuild(&entries(&[(200.0, 0), (350.0, 1), (550.0, 2)]), 20.0);
        assert_eq!(state.total_width, 1140.0);
        let offsets: Vec<f32> = state.items.iter().map(|i| i.rest_offset_x).collect();
        assert_eq!(offsets, vec![-470.0, -175.0, 295.0]);
        // Left edges follow from center - width / 2
        let left: Vec<f32> = state.items.iter().map(|i| i.rest_offset_x - i.width / 2.0).collect();
        assert_eq!(left, vec![-570.0, -350.0, 20.0]);
    }

    #[test]
    fn test_width_conservation() {
        let mut assigner = SizeAssigner::new(Some(7));
        let mut list = Vec::new();
        for n in 1..12 {
            let prev = list.last().map(|e: &CarouselEntry| e.size.bucket);
            list.push(CarouselEntry::new(square(), assigner.assign(prev)));
            let state = CarouselState::rebuild(&list, 20.0);
            let sum: f32 = state.items.iter().map(|i| i.width).sum();
            assert!((state.total_width - (sum + (n - 1) as f32 * 20.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rebuild_idempotent() {
        let mut assigner = SizeAssigner::new(None);
        let mut list = Vec::new();
        for _ in 0..5 {
            let prev = list.last().map(|e: &CarouselEntry| e.size.bucket);
            list.push(CarouselEntry::new(square(), assigner.assign(prev)));
        }
        let a = CarouselState::rebuild(&list, 20.0);
        let b = CarouselState::rebuild(&list, 20.0);
        assert_eq!(a.total_width.to_bits(), b.total_width.to_bits());
        for (x, y) in a.items.iter().zip(&b.items) {
            assert_eq!(x.rest_offset_x.to_bits(), y.rest_offset_x.to_bits());
            assert_eq!(x.assigned_height.to_bits(), y.assigned_height.to_bits());
        }
    }

    #[test]
    fn test_adjacent_buckets_differ() {
        for seed in 0..50 {
            let mut assigner = SizeAssigner::new(Some(seed));
            let mut prev = None;
            for _ in 0..20 {
                let a = assigner.assign(prev);
                assert_ne!(Some(a.bucket), prev);
                let bucket = SIZE_BUCKETS[a.bucket as usize];
                assert!(a.height >= bucket.min && a.height <= bucket.max);
                prev = Some(a.bucket);
            }
        }
    }

    #[test]
    fn test_aspect_ratio_width() {
        let wide = Arc::new(SourceImage::solid(20, 10, [0, 0, 0, 255]));
        let list = vec![CarouselEntry::new(wide, SizeAssignment { height: 300.0, bucket: 1 })];
        let state = CarouselState::rebuild(&list, 20.0);
        assert_eq!(state.items[0].width, 600.0);
        assert_eq!(state.items[0].rest_offset_x, 0.0);
        assert_eq!(state.total_width, 600.0);
    }
}
