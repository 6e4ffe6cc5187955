//! Easing curves for carousel motion.
//!
//! Pure functions mapping normalized progress to an eased value. Callers
//! clamp the input to [0, 1] first; only `map_clamped` clamps internally.
//! `ease_out_back` overshoots above 1.0 before settling.

use serde::{Deserialize, Serialize};

/// Overshoot constant for `ease_out_back`
pub const BACK_OVERSHOOT: f32 = 1.70158;

/// Linear remap of `value` from `[in_min, in_max]` to `[out_min, out_max]`,
/// clamped to the output range (either orientation).
pub fn map_clamped(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let span = in_max - in_min;
    if span.abs() <= f32::EPSILON {
        return out_min;
    }
    let mapped = out_min + (value - in_min) / span * (out_max - out_min);
    let (lo, hi) = if out_min <= out_max {
        (out_min, out_max)
    } else {
        (out_max, out_min)
    };
    mapped.clamp(lo, hi)
}

#[inline]
pub fn ease_in_out_quint(x: f32) -> f32 {
    if x < 0.5 {
        16.0 * x * x * x * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(5) / 2.0
    }
}

/// Exponential ease-out: 1 - 2^(-10x), exactly 1.0 at x = 1
#[inline]
pub fn ease_out_expo(x: f32) -> f32 {
    if x >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * x)
    }
}

#[inline]
pub fn ease_out_back(x: f32) -> f32 {
    let c1 = BACK_OVERSHOOT;
    let c3 = c1 + 1.0;
    let u = x - 1.0;
    1.0 + c3 * u * u * u + c1 * u * u
}

/// Named easing curve, so timeline presets can be plain data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    InOutQuint,
    OutExpo,
    OutBack,
}

impl Easing {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Easing::Linear => x,
            Easing::InOutQuint => ease_in_out_quint(x),
            Easing::OutExpo => ease_out_expo(x),
            Easing::OutBack => ease_out_back(x),
        }
    }
}
