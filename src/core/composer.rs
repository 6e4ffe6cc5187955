//! Frame composer: timeline output + layout + text metrics -> `DrawPlan`.
//!
//! Pure. Nothing here draws; a `RenderSurface` executes the plan.
//!
//! # Coordinates
//!
//! World units are pixels at zoom 1. The origin is the viewport center, y is
//! the vertical center line that labels and planes share. The camera first
//! translates by `translate_x`, then scales by `zoom` about the origin:
//!
//! ```text
//! screen_x = viewport_w / 2 + zoom * (world_x + translate_x)
//! ```

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::layout::CarouselState;
use super::timeline::{TimelineOutput, TimingStyle};
use crate::entities::text::{LabelFont, TEXT_SIZE};
use crate::entities::SourceImage;

/// Share of the viewport width the composition may occupy
pub const SAFE_VIEWPORT_FRACTION: f32 = 0.85;

/// Planes at or below this scale are skipped
pub const MIN_VISIBLE_SCALE: f32 = 0.001;

/// Measured label widths for the current frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    pub left_width: f32,
    pub right_width: f32,
}

/// Label contents
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub left: String,
    pub right: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            left: "Coffee Houses ".to_string(),
            right: "curated by @DAVIDSMITH".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn background(self) -> [u8; 4] {
        match self {
            Theme::Dark => [0, 0, 0, 255],
            Theme::Light => [255, 255, 255, 255],
        }
    }

    pub fn foreground(self) -> [u8; 4] {
        match self {
            Theme::Dark => [255, 255, 255, 255],
            Theme::Light => [0, 0, 0, 255],
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Horizontal anchor of a text draw
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    /// Text starts at `position.x`
    Left,
    /// Text ends at `position.x`
    Right,
}

#[derive(Clone, Debug)]
pub enum DrawCommand {
    Text {
        content: String,
        position: Vec2,
        align: TextAlign,
        font: LabelFont,
        color: [u8; 4],
        size: f32,
    },
    /// Textured quad centered on `position`, drawn `width * scale` by `height * scale`
    Plane {
        image: Arc<SourceImage>,
        position: Vec2,
        scale: f32,
        width: f32,
        height: f32,
    },
}

/// Everything one frame needs, in draw order: clear, camera, texts, planes.
#[derive(Clone, Debug)]
pub struct DrawPlan {
    pub background: [u8; 4],
    pub zoom: f32,
    pub translate_x: f32,
    pub bounding_width: f32,
    pub center_offset: f32,
    /// Distance from the origin to either label anchor
    pub half_width: f32,
    pub commands: Vec<DrawCommand>,
}

impl DrawPlan {
    pub fn planes(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Plane { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Text { .. }))
    }

    /// World x -> screen x for a viewport of `viewport_width`
    pub fn world_to_screen_x(&self, world_x: f32, viewport_width: f32) -> f32 {
        viewport_width / 2.0 + self.zoom * (world_x + self.translate_x)
    }
}

/// Safety zoom: never let `bounding_width` exceed the safe share of the viewport
pub fn safety_zoom(bounding_width: f32, viewport_width: f32) -> f32 {
    let safe = viewport_width * SAFE_VIEWPORT_FRACTION;
    if bounding_width <= safe || bounding_width <= 0.0 {
        1.0
    } else {
        safe / bounding_width
    }
}

/// Scroll that puts the right label's center on the origin once the
/// pan-and-glide layout is fully open.
pub fn landing_scroll(state: &CarouselState, text_gap: f32, metrics: TextMetrics) -> f32 {
    -(state.total_width / 2.0 + text_gap + metrics.right_width / 2.0)
}

/// Builds draw plans for one timing style and theme.
#[derive(Clone, Debug)]
pub struct FrameComposer {
    pub style: TimingStyle,
    pub theme: Theme,
    pub text_size: f32,
}

impl FrameComposer {
    pub fn new(style: TimingStyle, theme: Theme) -> Self {
        Self { style, theme, text_size: TEXT_SIZE }
    }

    pub fn compose(
        &self,
        state: &CarouselState,
        output: &TimelineOutput,
        labels: &Labels,
        metrics: TextMetrics,
        viewport_width: f32,
    ) -> DrawPlan {
        let scale_of = |i: usize| output.item_scales.get(i).copied().unwrap_or(0.0);

        let mut planes = Vec::with_capacity(state.len());
        let cluster_width = match self.style {
            TimingStyle::HoldAndReverse => {
                // Widths and gaps collapse with their item's scale
                let count = state.len();
                let dynamic: f32 = state
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let s = scale_of(i);
                        let gap = if i + 1 < count { state.padding * s } else { 0.0 };
                        item.width * s + gap
                    })
                    .sum();

                let mut current_x = -dynamic / 2.0;
                for (i, item) in state.items.iter().enumerate() {
                    let s = scale_of(i);
                    let current_w = item.width * s;
                    if s > MIN_VISIBLE_SCALE {
                        planes.push(DrawCommand::Plane {
                            image: Arc::clone(&item.image),
                            position: Vec2::new(current_x + current_w / 2.0, 0.0),
                            scale: s,
                            width: item.width,
                            height: item.assigned_height,
                        });
                    }
                    current_x += current_w;
                    if i + 1 < count {
                        current_x += state.padding * s;
                    }
                }
                dynamic
            }
            TimingStyle::PanAndGlide => {
                // Positions stay at rest, only the uniform scale animates
                for (i, item) in state.items.iter().enumerate() {
                    let s = scale_of(i);
                    if s > MIN_VISIBLE_SCALE {
                        planes.push(DrawCommand::Plane {
                            image: Arc::clone(&item.image),
                            position: Vec2::new(item.rest_offset_x, 0.0),
                            scale: s,
                            width: item.width,
                            height: item.assigned_height,
                        });
                    }
                }
                state.total_width
            }
        };

        let gap = output.text_gap;
        let half_width = cluster_width / 2.0 + gap;
        let left_edge = -half_width - metrics.left_width;
        let right_edge = half_width + metrics.right_width;
        let bounding_width = metrics.left_width + gap + cluster_width + gap + metrics.right_width;
        let zoom = safety_zoom(bounding_width, viewport_width);
        let center_offset = (left_edge + right_edge) / 2.0;

        // Hold-and-reverse always centers on the label edges. Pan-and-glide
        // follows its scroll and only leans on the edges while still closed.
        let base = match self.style {
            TimingStyle::HoldAndReverse => 1.0,
            TimingStyle::PanAndGlide => 0.0,
        };
        let centering = (base + output.optical_shift).min(1.0);
        let translate_x = output.scroll_offset - center_offset * centering;

        let color = self.theme.foreground();
        let mut commands = Vec::with_capacity(planes.len() + 2);
        commands.push(DrawCommand::Text {
            content: labels.left.clone(),
            position: Vec2::new(-half_width, 0.0),
            align: TextAlign::Right,
            font: LabelFont::Serif,
            color,
            size: self.text_size,
        });
        commands.push(DrawCommand::Text {
            content: labels.right.clone(),
            position: Vec2::new(half_width, 0.0),
            align: TextAlign::Left,
            font: LabelFont::Sans,
            color,
            size: self.text_size,
        });
        commands.extend(planes);

        DrawPlan {
            background: self.theme.background(),
            zoom,
            translate_x,
            bounding_width,
            center_offset,
            half_width,
            commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::{CarouselEntry, SizeAssignment};
    use crate::core::timeline::{Timeline, TimelineConfig};

    fn square_state(heights: &[f32], padding: f32) -> CarouselState {
        let entries: Vec<CarouselEntry> = heights
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                CarouselEntry::new(
                    Arc::new(SourceImage::solid(10, 10, [255; 4])),
                    SizeAssignment { height: h, bucket: i as u8 % 3 },
                )
            })
            .collect();
        CarouselState::rebuild(&entries, padding)
    }

    fn open_output(count: usize, text_gap: f32) -> TimelineOutput {
        TimelineOutput {
            progress: 60.0,
            open_fraction: 1.0,
            item_scales: vec![1.0; count],
            text_gap,
            scroll_offset: 0.0,
            optical_shift: 0.0,
        }
    }

    #[test]
    fn test_empty_labels_meet_at_center() {
        let composer = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Dark);
        let state = CarouselState::default();
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        let output = timeline.evaluate_manual(0, 0.0);
        let metrics = TextMetrics { left_width: 180.0, right_width: 300.0 };
        let plan = composer.compose(&state, &output, &Labels::default(), metrics, 1000.0);

        assert_eq!(plan.bounding_width, 480.0);
        assert_eq!(plan.zoom, 1.0);
        assert_eq!(plan.half_width, 0.0);
        assert_eq!(plan.planes().count(), 0);
        // Both anchors on the origin, composition centered on screen
        for cmd in plan.texts() {
            if let DrawCommand::Text { position, .. } = cmd {
                assert_eq!(position.x, 0.0);
            }
        }
        let left = plan.world_to_screen_x(-180.0, 1000.0);
        let right = plan.world_to_screen_x(300.0, 1000.0);
        assert!(((left + right) / 2.0 - 500.0).abs() < 1e-4);
    }

    #[test]
    fn test_open_plane_positions() {
        let composer = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Dark);
        let state = square_state(&[200.0, 350.0, 550.0], 20.0);
        let plan = composer.compose(&state, &open_output(3, 20.0), &Labels::default(), TextMetrics::default(), 4000.0);

        let xs: Vec<f32> = plan
            .planes()
            .filter_map(|c| match c {
                DrawCommand::Plane { position, .. } => Some(position.x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![-470.0, -175.0, 295.0]);
        assert_eq!(plan.half_width, 570.0 + 20.0);
        assert_eq!(plan.bounding_width, 1140.0 + 40.0);
    }

    #[test]
    fn test_collapsed_items_skipped() {
        let composer = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Dark);
        let state = square_state(&[200.0, 350.0], 20.0);
        let mut output = open_output(2, 20.0);
        output.item_scales = vec![1.0, 0.0];
        let plan = composer.compose(&state, &output, &Labels::default(), TextMetrics::default(), 1000.0);
        assert_eq!(plan.planes().count(), 1);
        // Gap after a collapsed neighbour is gone too: cluster = 200 + 20 * 1
        assert_eq!(plan.half_width, 110.0 + 20.0);
    }

    #[test]
    fn test_zoom_monotonic() {
        let composer = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Dark);
        let state = square_state(&[200.0, 350.0, 550.0], 20.0);
        let output = open_output(3, 20.0);
        let mut last = f32::MAX;
        let mut last_bounding = 0.0;
        for step in 0..200 {
            let metrics = TextMetrics { left_width: 50.0, right_width: step as f32 * 25.0 };
            let plan = composer.compose(&state, &output, &Labels::default(), metrics, 2000.0);
            assert!(plan.bounding_width >= last_bounding);
            assert!(plan.zoom <= last);
            if plan.bounding_width <= 2000.0 * SAFE_VIEWPORT_FRACTION {
                assert_eq!(plan.zoom, 1.0);
            } else {
                assert!(plan.zoom * plan.bounding_width <= 2000.0 * SAFE_VIEWPORT_FRACTION + 1e-2);
            }
            last = plan.zoom;
            last_bounding = plan.bounding_width;
        }
    }

    #[test]
    fn test_center_offset_balances_labels() {
        let composer = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Light);
        let state = square_state(&[300.0], 20.0);
        let metrics = TextMetrics { left_width: 100.0, right_width: 400.0 };
        let plan = composer.compose(&state, &open_output(1, 20.0), &Labels::default(), metrics, 1000.0);
        assert_eq!(plan.center_offset, 150.0);
        assert_eq!(plan.translate_x, -150.0);
        assert_eq!(plan.background, [255, 255, 255, 255]);
    }

    #[test]
    fn test_pan_glide_lands_on_right_label() {
        let composer = FrameComposer::new(TimingStyle::PanAndGlide, Theme::Dark);
        let timeline = Timeline::new(TimelineConfig::pan_and_glide());
        let state = square_state(&[200.0, 350.0, 550.0], 20.0);
        let metrics = TextMetrics { left_width: 250.0, right_width: 380.0 };
        let landing = landing_scroll(&state, timeline.config().text_gap, metrics);
        let output = timeline.evaluate(1_000, state.len(), landing);
        let plan = composer.compose(&state, &output, &Labels::default(), metrics, 1000.0);

        let right_center = plan.half_width + metrics.right_width / 2.0;
        assert!((plan.world_to_screen_x(right_center, 1000.0) - 500.0).abs() < 1e-3);
        // Planes keep their rest positions
        let xs: Vec<f32> = plan
            .planes()
            .filter_map(|c| match c {
                DrawCommand::Plane { position, .. } => Some(position.x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![-470.0, -175.0, 295.0]);
    }

    #[test]
    fn test_texts_before_planes() {
        let composer = FrameComposer::new(TimingStyle::HoldAndReverse, Theme::Dark);
        let state = square_state(&[200.0, 350.0], 20.0);
        let plan = composer.compose(&state, &open_output(2, 20.0), &Labels::default(), TextMetrics::default(), 1000.0);
        assert!(matches!(plan.commands[0], DrawCommand::Text { align: TextAlign::Right, font: LabelFont::Serif, .. }));
        assert!(matches!(plan.commands[1], DrawCommand::Text { align: TextAlign::Left, font: LabelFont::Sans, .. }));
        assert!(plan.commands[2..].iter().all(|c| matches!(c, DrawCommand::Plane { .. })));
    }

    #[test]
    fn test_pan_glide_manual_is_centered() {
        let composer = FrameComposer::new(TimingStyle::PanAndGlide, Theme::Dark);
        let timeline = Timeline::new(TimelineConfig::pan_and_glide());
        let state = square_state(&[200.0, 350.0, 550.0], 20.0);
        let metrics = TextMetrics { left_width: 250.0, right_width: 380.0 };
        // Pointer in the middle: no scroll
        let output = timeline.evaluate_manual(state.len(), 0.0);
        let plan = composer.compose(&state, &output, &Labels::default(), metrics, 3000.0);

        assert_eq!(plan.center_offset, 65.0);
        let left_edge = plan.world_to_screen_x(-plan.half_width - metrics.left_width, 3000.0);
        let right_edge = plan.world_to_screen_x(plan.half_width + metrics.right_width, 3000.0);
        assert!(((left_edge + right_edge) / 2.0 - 1500.0).abs() < 1e-3);
    }
}
