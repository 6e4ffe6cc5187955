//! Interaction controller: pointer X -> smoothed manual scroll.
//!
//! Pointer left of center pushes the view left (positive scroll), right of
//! center pushes it right. The mapping spans `±total_width / 2` across the
//! viewport. Each tick closes `SMOOTHING` of the remaining distance, so
//! the scroll never jumps, except when the carousel empties, where it snaps
//! back to 0.

use super::easing::map_clamped;

/// Fraction of the remaining distance covered per tick
pub const SMOOTHING: f32 = 0.1;

/// Exponentially smoothed manual scroll
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    current: f32,
    target: f32,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Snap to 0 (recording start, carousel reset)
    pub fn reset(&mut self) {
        self.current = 0.0;
        self.target = 0.0;
    }

    /// Target scroll for a pointer at `pointer_x` over a `viewport_width`-wide view
    pub fn target_for(pointer_x: f32, viewport_width: f32, total_width: f32) -> f32 {
        let limit = total_width / 2.0;
        map_clamped(pointer_x, 0.0, viewport_width, limit, -limit)
    }

    /// Move one step toward `target`
    pub fn step_toward(&mut self, target: f32) -> f32 {
        self.target = target;
        self.current += (target - self.current) * SMOOTHING;
        self.current
    }

    /// One frame tick. Without a pointer the last target is kept.
    pub fn tick(&mut self, pointer_x: Option<f32>, viewport_width: f32, total_width: f32, item_count: usize) -> f32 {
        if item_count == 0 {
            self.reset();
            return 0.0;
        }
        let target = match pointer_x {
            Some(x) => Self::target_for(x, viewport_width, total_width),
            None => self.target,
        };
        self.step_toward(target)
    }
}
