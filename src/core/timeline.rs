//! Timeline model: elapsed frame count -> per-element animation state.
//!
//! One engine, parametrized by `TimelineConfig`. Variants are presets,
//! not code forks:
//! - `hold_and_reverse()`: delay -> open -> hold -> close. Elapsed frames map
//!   to a virtual time `t` that ramps up, holds, then runs back to 0.
//!   Items ramp in with a per-item stagger (`ease_in_out_quint`).
//! - `pan_and_glide()`: delay -> pan -> glide. Scroll anticipates with a short
//!   `ease_out_expo` pan to an overshoot offset, then glides
//!   (`ease_in_out_quint`) to a landing position. Items pop in with
//!   `ease_out_back`.
//!
//! # Determinism
//!
//! `evaluate()` depends only on its arguments and the static config. No
//! wall clock is read anywhere, so a recording replays bit-identically.
//!
//! # Phase boundaries
//!
//! Each phase covers `(start, start + duration]`; the first phase also owns
//! frame 0. Past the final phase, `phase_at()` clamps to the end of it.

use serde::{Deserialize, Serialize};

use super::easing::{ease_in_out_quint, ease_out_back, ease_out_expo, Easing};

/// Named animation phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    Delay,
    Open,
    Hold,
    Close,
    Pan,
    Glide,
}

/// Phase with absolute start offset (frames)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub start: u32,
    pub duration: u32,
}

impl Phase {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.duration)
    }
}

/// Contiguous, monotonically increasing phase schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePhaseConfig {
    phases: Vec<Phase>,
}

impl TimelinePhaseConfig {
    /// Build from (kind, duration) pairs; starts are accumulated so phases
    /// can never overlap or leave gaps.
    pub fn from_durations(durations: &[(PhaseKind, u32)]) -> Self {
        let mut start = 0;
        let phases = durations
            .iter()
            .map(|&(kind, duration)| {
                let phase = Phase { kind, start, duration };
                start = start.saturating_add(duration);
                phase
            })
            .collect();
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Sum of all phase durations
    pub fn total_duration(&self) -> u32 {
        self.phases.last().map(Phase::end).unwrap_or(0)
    }

    /// Phase containing `elapsed` and the frame offset inside it.
    ///
    /// Total for every `elapsed`; returns `None` only for an empty schedule.
    pub fn phase_at(&self, elapsed: u32) -> Option<(PhaseKind, u32)> {
        for phase in &self.phases {
            if elapsed <= phase.end() {
                return Some((phase.kind, elapsed.saturating_sub(phase.start)));
            }
        }
        self.phases.last().map(|p| (p.kind, p.duration))
    }
}

/// Timing style selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingStyle {
    HoldAndReverse,
    PanAndGlide,
}

impl TimingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingStyle::HoldAndReverse => "hold-reverse",
            TimingStyle::PanAndGlide => "pan-glide",
        }
    }
}

/// Static animation configuration. All durations are in frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub style: TimingStyle,
    /// Pause before anything moves
    pub delay: u32,

    // Hold-and-reverse
    /// Forward (open) duration, also the peak virtual time
    pub open_duration: u32,
    pub hold_duration: u32,
    /// Virtual-time offset between consecutive item ramps
    pub item_stagger: f32,
    /// Virtual-time length of one item ramp
    pub item_ramp: f32,
    pub item_easing: Easing,

    // Pan-and-glide
    pub pan_duration: u32,
    pub glide_duration: u32,
    /// Scroll offset reached at the end of the anticipation pan
    pub pan_overshoot: f32,
    pub pop_stagger: f32,
    pub pop_duration: f32,
    /// Frames for the text gap to open
    pub text_gap_duration: f32,

    /// Gap between labels and the image cluster when fully open
    pub text_gap: f32,
    /// Extra centering weight applied while closed, decays as the layout opens
    pub optical_shift_strength: f32,
    /// Frames recorded after the schedule ends
    pub trailing_buffer: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::hold_and_reverse()
    }
}

impl TimelineConfig {
    /// Open, hold at full width, close again.
    pub fn hold_and_reverse() -> Self {
        Self {
            style: TimingStyle::HoldAndReverse,
            delay: 30,
            open_duration: 60,
            hold_duration: 30,
            item_stagger: 2.0,
            item_ramp: 25.0,
            item_easing: Easing::InOutQuint,
            pan_duration: 0,
            glide_duration: 0,
            pan_overshoot: 0.0,
            pop_stagger: 0.0,
            pop_duration: 1.0,
            text_gap_duration: 1.0,
            text_gap: 20.0,
            optical_shift_strength: 0.0,
            trailing_buffer: 60,
        }
    }

    /// Anticipation pan, then a long glide onto the trailing label.
    pub fn pan_and_glide() -> Self {
        Self {
            style: TimingStyle::PanAndGlide,
            delay: 30,
            open_duration: 0,
            hold_duration: 0,
            item_stagger: 0.0,
            item_ramp: 1.0,
            item_easing: Easing::InOutQuint,
            pan_duration: 20,
            glide_duration: 90,
            pan_overshoot: 150.0,
            pop_stagger: 4.0,
            pop_duration: 20.0,
            text_gap_duration: 30.0,
            text_gap: 20.0,
            optical_shift_strength: 0.35,
            trailing_buffer: 60,
        }
    }

    pub fn preset(style: TimingStyle) -> Self {
        match style {
            TimingStyle::HoldAndReverse => Self::hold_and_reverse(),
            TimingStyle::PanAndGlide => Self::pan_and_glide(),
        }
    }

    pub fn phases(&self) -> TimelinePhaseConfig {
        match self.style {
            TimingStyle::HoldAndReverse => TimelinePhaseConfig::from_durations(&[
                (PhaseKind::Delay, self.delay),
                (PhaseKind::Open, self.open_duration),
                (PhaseKind::Hold, self.hold_duration),
                (PhaseKind::Close, self.open_duration),
            ]),
            TimingStyle::PanAndGlide => TimelinePhaseConfig::from_durations(&[
                (PhaseKind::Delay, self.delay),
                (PhaseKind::Pan, self.pan_duration),
                (PhaseKind::Glide, self.glide_duration),
            ]),
        }
    }

    /// Last frame captured: full schedule plus the trailing buffer.
    /// Recording stops once elapsed frames exceed this.
    pub fn stop_frame(&self) -> u32 {
        self.phases().total_duration().saturating_add(self.trailing_buffer)
    }
}

/// Render-time animation state for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineOutput {
    /// Virtual time `t` (hold-and-reverse) or frames since the delay ended
    pub progress: f32,
    /// 0 = closed, 1 = fully open
    pub open_fraction: f32,
    pub item_scales: Vec<f32>,
    pub text_gap: f32,
    pub scroll_offset: f32,
    /// Unitless weight in [0, strength], see `TimelineConfig::optical_shift_strength`.
    /// Pan-and-glide manual mode uses 1: no landing to follow, center on the labels.
    pub optical_shift: f32,
}

/// Pure evaluator over a `TimelineConfig`.
#[derive(Clone, Debug)]
pub struct Timeline {
    config: TimelineConfig,
    phases: TimelinePhaseConfig,
}

impl Timeline {
    pub fn new(config: TimelineConfig) -> Self {
        let phases = config.phases();
        Self { config, phases }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn phases(&self) -> &TimelinePhaseConfig {
        &self.phases
    }

    /// Scripted state at `elapsed` frames.
    ///
    /// `landing` is the pan-and-glide end scroll (ignored by hold-and-reverse);
    /// callers compute it from the same frame's text metrics.
    pub fn evaluate(&self, elapsed: u32, item_count: usize, landing: f32) -> TimelineOutput {
        match self.config.style {
            TimingStyle::HoldAndReverse => self.evaluate_hold_reverse(elapsed, item_count),
            TimingStyle::PanAndGlide => self.evaluate_pan_glide(elapsed, item_count, landing),
        }
    }

    /// Interactive state: fully open, scroll supplied by the interaction controller.
    pub fn evaluate_manual(&self, item_count: usize, scroll: f32) -> TimelineOutput {
        let text_gap = if item_count > 0 || self.config.style == TimingStyle::PanAndGlide {
            self.config.text_gap
        } else {
            0.0
        };
        TimelineOutput {
            progress: self.peak_progress(),
            open_fraction: 1.0,
            item_scales: vec![1.0; item_count],
            text_gap,
            scroll_offset: scroll,
            optical_shift: match self.config.style {
                TimingStyle::HoldAndReverse => 0.0,
                TimingStyle::PanAndGlide => 1.0,
            },
        }
    }

    fn peak_progress(&self) -> f32 {
        match self.config.style {
            TimingStyle::HoldAndReverse => self.config.open_duration as f32,
            TimingStyle::PanAndGlide => self.config.pan_duration.saturating_add(self.config.glide_duration) as f32,
        }
    }

    /// Virtual time for hold-and-reverse
    pub fn virtual_time(&self, elapsed: u32) -> f32 {
        let open = self.config.open_duration as f32;
        match self.phases.phase_at(elapsed) {
            Some((PhaseKind::Open, local)) => local as f32,
            Some((PhaseKind::Hold, _)) => open,
            Some((PhaseKind::Close, local)) => (open - local as f32).max(0.0),
            _ => 0.0,
        }
    }

    /// Ramp for item `index` at virtual time `t`: 0 before start, 1 after end
    pub fn item_scale(&self, t: f32, index: usize) -> f32 {
        let start = index as f32 * self.config.item_stagger;
        let duration = self.config.item_ramp;
        if t < start {
            return 0.0;
        }
        if t > start + duration || duration <= 0.0 {
            return 1.0;
        }
        let p = ((t - start) / duration).clamp(0.0, 1.0);
        self.config.item_easing.apply(p).clamp(0.0, 1.0)
    }

    fn evaluate_hold_reverse(&self, elapsed: u32, item_count: usize) -> TimelineOutput {
        let t = self.virtual_time(elapsed);
        let item_scales: Vec<f32> = (0..item_count).map(|i| self.item_scale(t, i)).collect();
        // Gap opens with the first item
        let text_gap = item_scales.first().map(|s| self.config.text_gap * s).unwrap_or(0.0);
        let open_fraction = if self.config.open_duration > 0 {
            (t / self.config.open_duration as f32).clamp(0.0, 1.0)
        } else {
            1.0
        };
        TimelineOutput {
            progress: t,
            open_fraction,
            item_scales,
            text_gap,
            scroll_offset: 0.0,
            optical_shift: self.config.optical_shift_strength * (1.0 - open_fraction),
        }
    }

    fn evaluate_pan_glide(&self, elapsed: u32, item_count: usize, landing: f32) -> TimelineOutput {
        let cfg = &self.config;
        let local = elapsed.saturating_sub(cfg.delay) as f32;

        let scroll = match self.phases.phase_at(elapsed) {
            Some((PhaseKind::Pan, l)) => {
                cfg.pan_overshoot * ease_out_expo(fraction(l as f32, cfg.pan_duration as f32))
            }
            Some((PhaseKind::Glide, l)) => {
                let p = ease_in_out_quint(fraction(l as f32, cfg.glide_duration as f32));
                cfg.pan_overshoot + (landing - cfg.pan_overshoot) * p
            }
            _ => 0.0,
        };

        // Past the schedule the glide phase clamps to its end (landing)
        let item_scales = (0..item_count)
            .map(|i| {
                if elapsed <= cfg.delay {
                    return 0.0;
                }
                let start = i as f32 * cfg.pop_stagger;
                if local < start {
                    0.0
                } else {
                    let p = fraction(local - start, cfg.pop_duration);
                    if p >= 1.0 { 1.0 } else { ease_out_back(p) }
                }
            })
            .collect();

        let text_gap = if elapsed <= cfg.delay {
            0.0
        } else {
            cfg.text_gap * ease_out_expo(fraction(local, cfg.text_gap_duration))
        };

        let total = cfg.pan_duration.saturating_add(cfg.glide_duration) as f32;
        let open_fraction = if elapsed <= cfg.delay { 0.0 } else { fraction(local, total) };

        TimelineOutput {
            progress: local,
            open_fraction,
            item_scales,
            text_gap,
            scroll_offset: scroll,
            optical_shift: cfg.optical_shift_strength * (1.0 - open_fraction),
        }
    }
}

/// `value / duration` clamped to [0, 1]; zero-length phases count as done
#[inline]
fn fraction(value: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (value / duration).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_contiguous() {
        let phases = TimelineConfig::hold_and_reverse().phases();
        let list = phases.phases();
        assert_eq!(list[0].start, 0);
        for pair in list.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
        }
        assert_eq!(phases.total_duration(), 30 + 60 + 30 + 60);
    }

    #[test]
    fn test_phase_at_total() {
        let phases = TimelineConfig::hold_and_reverse().phases();
        assert_eq!(phases.phase_at(0), Some((PhaseKind::Delay, 0)));
        assert_eq!(phases.phase_at(30), Some((PhaseKind::Delay, 30)));
        assert_eq!(phases.phase_at(31), Some((PhaseKind::Open, 1)));
        assert_eq!(phases.phase_at(10_000), Some((PhaseKind::Close, 60)));
        assert_eq!(TimelinePhaseConfig::from_durations(&[]).phase_at(5), None);
    }

    #[test]
    fn test_virtual_time_schedule() {
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        assert_eq!(timeline.virtual_time(30), 0.0);
        assert_eq!(timeline.virtual_time(90), 60.0);
        assert_eq!(timeline.virtual_time(120), 60.0);
        assert_eq!(timeline.virtual_time(150), 30.0);
        assert_eq!(timeline.virtual_time(210), 0.0);
        assert_eq!(timeline.virtual_time(5_000), 0.0);
        assert_eq!(timeline.config().stop_frame(), 240);
    }

    #[test]
    fn test_delay_phase_values() {
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        let first = timeline.evaluate(0, 4, 0.0);
        for elapsed in 0..=30 {
            let out = timeline.evaluate(elapsed, 4, 0.0);
            assert_eq!(out, first);
            assert!(out.item_scales.iter().all(|&s| s == 0.0));
            assert_eq!(out.text_gap, 0.0);
        }
    }

    #[test]
    fn test_scales_clamped() {
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        for elapsed in (0..100_000).step_by(7) {
            let out = timeline.evaluate(elapsed, 40, 0.0);
            assert!(out.item_scales.iter().all(|&s| (0.0..=1.0).contains(&s)));
        }
    }

    #[test]
    fn test_item_stagger() {
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        assert_eq!(timeline.item_scale(0.0, 0), 0.0);
        assert_eq!(timeline.item_scale(3.9, 2), 0.0);
        assert_eq!(timeline.item_scale(26.0, 0), 1.0);
        let mid = timeline.item_scale(12.5, 0);
        assert!((mid - 0.5).abs() < 1e-5);
        // Later items trail earlier ones
        assert!(timeline.item_scale(10.0, 0) > timeline.item_scale(10.0, 3));
    }

    #[test]
    fn test_manual_fully_open() {
        let timeline = Timeline::new(TimelineConfig::hold_and_reverse());
        let out = timeline.evaluate_manual(30, 42.0);
        assert!(out.item_scales.iter().all(|&s| s == 1.0));
        assert_eq!(out.scroll_offset, 42.0);
        assert_eq!(out.text_gap, 20.0);
        assert_eq!(timeline.evaluate_manual(0, 0.0).text_gap, 0.0);
    }

    #[test]
    fn test_pan_glide_scroll() {
        let timeline = Timeline::new(TimelineConfig::pan_and_glide());
        let landing = -800.0;
        assert_eq!(timeline.evaluate(0, 3, landing).scroll_offset, 0.0);
        assert_eq!(timeline.evaluate(30, 3, landing).scroll_offset, 0.0);
        // End of pan reaches the overshoot
        let pan_end = timeline.evaluate(50, 3, landing).scroll_offset;
        assert!((pan_end - 150.0).abs() < 1e-3);
        // End of glide and beyond sit on the landing
        assert!((timeline.evaluate(140, 3, landing).scroll_offset - landing).abs() < 1e-3);
        assert!((timeline.evaluate(9_999, 3, landing).scroll_offset - landing).abs() < 1e-3);
        assert_eq!(timeline.config().stop_frame(), 30 + 20 + 90 + 60);
    }

    #[test]
    fn test_pan_glide_popin_overshoots() {
        let timeline = Timeline::new(TimelineConfig::pan_and_glide());
        let peak = (30..80)
            .map(|f| timeline.evaluate(f, 1, 0.0).item_scales[0])
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
        assert_eq!(timeline.evaluate(200, 3, 0.0).item_scales, vec![1.0, 1.0, 1.0]);
        // Second item starts pop_stagger frames later
        assert_eq!(timeline.evaluate(33, 2, 0.0).item_scales[1], 0.0);
    }

    #[test]
    fn test_optical_shift_decays() {
        let timeline = Timeline::new(TimelineConfig::pan_and_glide());
        let closed = timeline.evaluate(10, 2, 0.0).optical_shift;
        let open = timeline.evaluate(500, 2, 0.0).optical_shift;
        assert!((closed - 0.35).abs() < 1e-6);
        assert_eq!(open, 0.0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = TimelineConfig {
            delay: u32::MAX,
            ..TimelineConfig::hold_and_reverse()
        };
        assert_eq!(config.stop_frame(), u32::MAX);
        let phases = config.phases();
        assert_eq!(phases.total_duration(), u32::MAX);
        assert!(phases.phases().iter().all(|p| p.end() == u32::MAX));

        let timeline = Timeline::new(config);
        let out = timeline.evaluate(u32::MAX, 2, 0.0);
        assert!(out.item_scales.iter().all(|&s| (0.0..=1.0).contains(&s)));

        let glide = Timeline::new(TimelineConfig {
            pan_duration: u32::MAX,
            glide_duration: u32::MAX,
            ..TimelineConfig::pan_and_glide()
        });
        assert_eq!(glide.config().stop_frame(), u32::MAX);
        let _ = glide.evaluate(1_000, 1, -50.0);
        let _ = glide.evaluate_manual(1, 0.0);
    }

    #[test]
    fn test_manual_centering_weight() {
        let pan = Timeline::new(TimelineConfig::pan_and_glide());
        assert_eq!(pan.evaluate_manual(3, 12.0).optical_shift, 1.0);
        let hold = Timeline::new(TimelineConfig::hold_and_reverse());
        assert_eq!(hold.evaluate_manual(3, 12.0).optical_shift, 0.0);
    }
}
