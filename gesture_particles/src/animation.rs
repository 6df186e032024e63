//! Per-frame animation of the particle field.
//!
//! Each tick turns the latest gesture reading into a target scale, low-pass
//! filters it, and rewrites every particle from its generated position:
//!
//! ```text
//! current[i] = perturb(shape, initial[i] × smoothed_scale, i, elapsed)
//! ```
//!
//! With a hand in view the target is `0.5 + 2·distance`; without one it is
//! an idle breathing oscillation `1 + 0.2·sin(0.8·t)`.

use std::f32::consts::TAU;

use glam::Vec3;
use hand_gesture::GestureSignal;
use particle_shapes::{generate_with, Shape};
use rand::Rng;

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

/// Fraction of the remaining gap closed per second of `dt` (clamped to 1).
pub const SCALE_RESPONSE:  f32 = 3.0;
pub const TRACKING_BASE:   f32 = 0.5;
pub const TRACKING_GAIN:   f32 = 2.0;
pub const IDLE_RATE:       f64 = 0.8;
pub const IDLE_AMPLITUDE:  f32 = 0.2;

/// Radians per second about the vertical axis.
pub const SPIN_RATE:       f32 = 0.1;
pub const TILT_RATE:       f64 = 0.2;
pub const TILT_AMPLITUDE:  f32 = 0.1;

pub const JITTER_RATE:      f64 = 2.0;
pub const JITTER_AMPLITUDE: f32 = 0.05;
pub const PETAL_BREATH:     f32 = 0.1;

// ════════════════════════════════════════════════════════════════════════════
// Scale
// ════════════════════════════════════════════════════════════════════════════

/// Tracking (hand in view) or idle breathing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Tracking,
    Idle,
}

impl Mode {
    pub fn of(signal: GestureSignal) -> Mode {
        if signal.is_tracking { Mode::Tracking } else { Mode::Idle }
    }
}

/// Scale the field should head towards this tick.
pub fn target_scale(signal: GestureSignal, elapsed: f64) -> f32 {
    match Mode::of(signal) {
        Mode::Tracking => TRACKING_BASE + signal.distance * TRACKING_GAIN,
        Mode::Idle     => 1.0 + (elapsed * IDLE_RATE).sin() as f32 * IDLE_AMPLITUDE,
    }
}

/// First-order low-pass step from `current` toward `target`.
pub fn smooth_scale(current: f32, target: f32, dt: f32) -> f32 {
    let t = (dt * SCALE_RESPONSE).clamp(0.0, 1.0);
    current + (target - current) * t
}

/// Shape-specific per-particle wobble applied after scaling.
///
/// The particle index doubles as a fixed phase offset, so the result is a
/// deterministic function of `(index, elapsed)`.
pub fn perturb(shape: Shape, p: Vec3, index: usize, elapsed: f64) -> Vec3 {
    match shape {
        Shape::Fireworks => {
            let phase = elapsed * JITTER_RATE + index as f64;
            let s = phase.sin() as f32 * JITTER_AMPLITUDE;
            let c = phase.cos() as f32 * JITTER_AMPLITUDE;
            Vec3::new(p.x + s, p.y + c, p.z + s)
        }
        Shape::Flower => {
            let breathe = (elapsed + p.x as f64).sin() as f32 * PETAL_BREATH;
            Vec3::new(p.x * (1.0 + breathe), p.y * (1.0 + breathe), p.z)
        }
        Shape::Heart | Shape::Saturn | Shape::Scatter => p,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField
// ════════════════════════════════════════════════════════════════════════════

/// Generated and animated positions for the active shape.
///
/// `initial` is replaced wholesale on a shape change and otherwise never
/// written; `current` is rewritten in place every tick.  Both always have the
/// same length.
#[derive(Clone, Debug)]
pub struct ParticleField {
    shape:    Shape,
    initial:  Vec<Vec3>,
    current:  Vec<Vec3>,
    revision: u64,
}

impl ParticleField {
    pub fn new(shape: Shape, count: usize) -> Self {
        Self::with_rng(shape, count, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(shape: Shape, count: usize, rng: &mut R) -> Self {
        Self::from_positions(shape, generate_with(count, shape, rng))
    }

    pub fn from_positions(shape: Shape, initial: Vec<Vec3>) -> Self {
        let current = initial.clone();
        ParticleField { shape, initial, current, revision: 0 }
    }

    /// Regenerate for `shape`, keeping the particle count.
    pub fn set_shape(&mut self, shape: Shape) {
        self.set_shape_with(shape, &mut rand::thread_rng());
    }

    pub fn set_shape_with<R: Rng + ?Sized>(&mut self, shape: Shape, rng: &mut R) {
        let count = self.initial.len();
        let initial = generate_with(count, shape, rng);
        tracing::info!(shape = %shape, count, "regenerated particle field");
        self.current.clone_from(&initial);
        self.initial  = initial;
        self.shape    = shape;
        self.revision += 1;
    }

    pub fn shape(&self)    -> Shape     { self.shape }
    pub fn len(&self)      -> usize     { self.initial.len() }
    pub fn is_empty(&self) -> bool      { self.initial.is_empty() }
    pub fn initial(&self)  -> &[Vec3]   { &self.initial }
    pub fn current(&self)  -> &[Vec3]   { &self.current }
    /// Bumped whenever `current` changes; renderers re-upload on change.
    pub fn revision(&self) -> u64       { self.revision }
}

// ════════════════════════════════════════════════════════════════════════════
// AnimationEngine
// ════════════════════════════════════════════════════════════════════════════

/// Engine state carried between ticks.  Survives shape changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    /// Seconds since start.  Kept in `f64` so long sessions keep advancing.
    pub elapsed:        f64,
    pub smoothed_scale: f32,
    /// Target computed on the most recent tick.
    pub target_scale:   f32,
    /// Rotation about the vertical axis, wrapped into `[0, 2π)`.
    pub spin:           f32,
    /// Oscillating tilt on the third axis (Saturn only, else 0).
    pub tilt:           f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        AnimationState {
            elapsed:        0.0,
            smoothed_scale: 1.0,
            target_scale:   1.0,
            spin:           0.0,
            tilt:           0.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct AnimationEngine {
    state: AnimationState,
}

impl AnimationEngine {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> &AnimationState { &self.state }

    /// Whole-field rotation as Euler angles (x, y, z).
    pub fn rotation(&self) -> Vec3 {
        Vec3::new(0.0, self.state.spin, self.state.tilt)
    }

    /// Advance by `dt` seconds and rewrite `field.current`.
    pub fn tick(&mut self, dt: f32, signal: GestureSignal, field: &mut ParticleField) -> Mode {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let s = &mut self.state;

        s.elapsed       += dt as f64;
        s.target_scale   = target_scale(signal, s.elapsed);
        s.smoothed_scale = smooth_scale(s.smoothed_scale, s.target_scale, dt);

        s.spin = (s.spin + dt * SPIN_RATE).rem_euclid(TAU);
        s.tilt = if field.shape == Shape::Saturn {
            (s.elapsed * TILT_RATE).sin() as f32 * TILT_AMPLITUDE
        } else {
            0.0
        };

        let (scale, elapsed, shape) = (s.smoothed_scale, s.elapsed, field.shape);
        for (i, (cur, init)) in field.current.iter_mut().zip(field.initial.iter()).enumerate() {
            *cur = perturb(shape, *init * scale, i, elapsed);
        }
        field.revision += 1;

        Mode::of(signal)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn field(shape: Shape, n: usize) -> ParticleField {
        ParticleField::with_rng(shape, n, &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn idle_target_starts_at_one() {
        assert_eq!(target_scale(GestureSignal::IDLE, 0.0), 1.0);
    }

    #[test]
    fn tracking_target_endpoints() {
        assert_eq!(target_scale(GestureSignal::tracking(0.0), 5.0), 0.5);
        assert_eq!(target_scale(GestureSignal::tracking(1.0), 5.0), 2.5);
    }

    #[test]
    fn smoothing_snaps_at_large_dt_and_holds_at_zero() {
        assert_eq!(smooth_scale(1.0, 2.0, 1.0), 2.0);
        assert_eq!(smooth_scale(1.0, 2.0, 10.0), 2.0);
        assert_eq!(smooth_scale(1.0, 2.0, 0.0), 1.0);
        assert!((smooth_scale(1.0, 2.0, 0.1) - 1.3).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn idle_target_stays_in_band(t in 0.0f32..10_000.0) {
            let s = target_scale(GestureSignal::IDLE, t.into());
            prop_assert!((0.8 - 1e-6..=1.2 + 1e-6).contains(&s));
        }

        #[test]
        fn smoothing_never_overshoots(cur in 0.0f32..5.0, tgt in 0.0f32..5.0, dt in 0.0f32..2.0) {
            let next = smooth_scale(cur, tgt, dt);
            let (lo, hi) = if cur <= tgt { (cur, tgt) } else { (tgt, cur) };
            prop_assert!(next >= lo - 1e-5 && next <= hi + 1e-5);
        }
    }

    #[test]
    fn tick_preserves_length_and_order() {
        let mut f = field(Shape::Heart, 500);
        let mut engine = AnimationEngine::new();
        engine.tick(1.0, GestureSignal::tracking(1.0), &mut f);
        assert_eq!(f.current().len(), f.initial().len());
        // Heart has no perturbation: current = initial × 2.5 exactly.
        for (c, i) in f.current().iter().zip(f.initial()) {
            assert!((*c - *i * 2.5).length() < 1e-5);
        }
    }

    #[test]
    fn tick_advances_time_spin_and_revision() {
        let mut f = field(Shape::Heart, 10);
        let mut engine = AnimationEngine::new();
        let rev = f.revision();
        engine.tick(0.5, GestureSignal::IDLE, &mut f);
        engine.tick(0.5, GestureSignal::IDLE, &mut f);
        assert!((engine.state().elapsed - 1.0).abs() < 1e-6);
        assert!((engine.state().spin - 0.1).abs() < 1e-6);
        assert_eq!(f.revision(), rev + 2);
    }

    #[test]
    fn zero_dt_keeps_scale() {
        let mut f = field(Shape::Heart, 10);
        let mut engine = AnimationEngine::new();
        engine.tick(0.0, GestureSignal::tracking(2.0), &mut f);
        assert_eq!(engine.state().smoothed_scale, 1.0);
        assert_eq!(engine.state().target_scale, 4.5);
    }

    #[test]
    fn saturn_tilts_and_others_do_not() {
        let mut engine = AnimationEngine::new();
        let mut saturn = field(Shape::Saturn, 10);
        engine.tick(2.0, GestureSignal::IDLE, &mut saturn);
        let expected = (2.0 * TILT_RATE).sin() as f32 * TILT_AMPLITUDE;
        assert!((engine.rotation().z - expected).abs() < 1e-6);

        let mut heart = field(Shape::Heart, 10);
        engine.tick(0.1, GestureSignal::IDLE, &mut heart);
        assert_eq!(engine.rotation().z, 0.0);
    }

    #[test]
    fn fireworks_jitter_uses_index_phase() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let q = perturb(Shape::Fireworks, p, 3, 0.5);
        let phase = 0.5f64 * 2.0 + 3.0;
        assert!((q.x - (1.0 + phase.sin() as f32 * 0.05)).abs() < 1e-6);
        assert!((q.y - (2.0 + phase.cos() as f32 * 0.05)).abs() < 1e-6);
        assert!((q.z - (3.0 + phase.sin() as f32 * 0.05)).abs() < 1e-6);
        // Deterministic in (index, time).
        assert_eq!(q, perturb(Shape::Fireworks, p, 3, 0.5));
        assert_ne!(q, perturb(Shape::Fireworks, p, 4, 0.5));
    }

    #[test]
    fn flower_breathes_in_plane_only() {
        let p = Vec3::new(0.5, -1.0, 0.7);
        let q = perturb(Shape::Flower, p, 0, 1.0);
        let b = (1.0f64 + 0.5).sin() as f32 * PETAL_BREATH;
        assert!((q.x - 0.5 * (1.0 + b)).abs() < 1e-6);
        assert!((q.y + 1.0 * (1.0 + b)).abs() < 1e-6);
        assert_eq!(q.z, 0.7);
    }

    #[test]
    fn static_shapes_are_untouched() {
        let p = Vec3::new(0.3, 0.2, 0.1);
        for s in [Shape::Heart, Shape::Saturn, Shape::Scatter] {
            assert_eq!(perturb(s, p, 7, 3.0), p);
        }
    }

    #[test]
    fn shape_change_keeps_count_and_scale_continuity() {
        let mut f = field(Shape::Heart, 300);
        let mut engine = AnimationEngine::new();
        engine.tick(0.1, GestureSignal::tracking(1.0), &mut f);
        let scale = engine.state().smoothed_scale;
        f.set_shape_with(Shape::Fireworks, &mut StdRng::seed_from_u64(3));
        assert_eq!(f.shape(), Shape::Fireworks);
        assert_eq!(f.len(), 300);
        assert_eq!(f.current().len(), 300);
        assert_eq!(engine.state().smoothed_scale, scale);
    }

    #[test]
    fn losing_tracking_switches_to_idle_target_next_tick() {
        let mut f = field(Shape::Heart, 10);
        let mut engine = AnimationEngine::new();
        assert_eq!(engine.tick(0.016, GestureSignal::tracking(1.5), &mut f), Mode::Tracking);
        assert_eq!(engine.state().target_scale, 3.5);
        assert_eq!(engine.tick(0.016, GestureSignal::IDLE, &mut f), Mode::Idle);
        let t = engine.state().elapsed;
        assert_eq!(engine.state().target_scale, 1.0 + (t * IDLE_RATE).sin() as f32 * IDLE_AMPLITUDE);
        // Smoothing damps the drop instead of snapping.
        assert!(engine.state().smoothed_scale > 1.1);
    }

    #[test]
    fn bad_dt_is_ignored() {
        let mut f = field(Shape::Heart, 4);
        let mut engine = AnimationEngine::new();
        engine.tick(f32::NAN, GestureSignal::IDLE, &mut f);
        engine.tick(-1.0, GestureSignal::IDLE, &mut f);
        assert_eq!(engine.state().elapsed, 0.0);
    }

    #[test]
    fn clock_keeps_advancing_after_days_of_uptime() {
        let mut f = field(Shape::Fireworks, 8);
        let mut engine = AnimationEngine::new();
        let start = 530_000.0;
        engine.state.elapsed = start;
        for _ in 0..600 {
            engine.tick(1.0 / 60.0, GestureSignal::IDLE, &mut f);
        }
        assert!((engine.state().elapsed - start - 10.0).abs() < 1e-6);
        // Jitter still moves from one frame to the next.
        let before = f.current()[0];
        engine.tick(1.0 / 60.0, GestureSignal::IDLE, &mut f);
        assert_ne!(f.current()[0], before);
    }

    #[test]
    fn spin_wraps_within_one_turn() {
        let mut f = field(Shape::Heart, 4);
        let mut engine = AnimationEngine::new();
        for _ in 0..200 {
            engine.tick(1.0, GestureSignal::IDLE, &mut f);
        }
        let spin = engine.state().spin;
        assert!((0.0..TAU).contains(&spin));
        assert!((spin - (20.0f32).rem_euclid(TAU)).abs() < 1e-3);
    }
}
