//! # particle_shapes
//!
//! Procedural point clouds for the four particle-field silhouettes.
//!
//! Every point is drawn independently from a closed-form parametric or
//! probabilistic formula, so a cloud of `N` points is just `N` calls to
//! [`sample_point`].  Randomness comes from whatever [`rand::Rng`] the caller
//! hands in; [`generate`] uses the thread-local generator.
//!
//! | Shape | Construction |
//! |---|---|
//! | Heart | thickened outline of `x = 16 sin³t`, `y = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t` |
//! | Flower | four-petal rose `r = 3 sin 4θ + 1.5`, flattened in depth |
//! | Saturn | 60 % ring (radius 3.5–6) + 40 % solid planet (radius 2), tilted π/6 |
//! | Fireworks | solid ball of radius 4.5 |
//! | Scatter | uniform cube of half-width 2.5 (fallback for unknown names) |
//!
//! ## Quick start
//!
//! ```rust
//! use particle_shapes::{generate_with, Shape};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let cloud = generate_with(1000, Shape::Saturn, &mut rng);
//! assert_eq!(cloud.len(), 1000);
//! ```

use std::f32::consts::{PI, TAU};
use std::fmt;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════════════

/// A particle-field silhouette.
///
/// Only the first four variants are user-selectable.  [`Shape::Scatter`] is
/// what an unrecognised shape name resolves to; it is never an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shape {
    Heart,
    Flower,
    Saturn,
    Fireworks,
    Scatter,
}

impl Shape {
    /// The selectable shapes, in menu order.
    pub const ALL: [Shape; 4] = [Shape::Heart, Shape::Flower, Shape::Saturn, Shape::Fireworks];

    /// Resolve a shape identifier (case-insensitive).
    /// Unknown identifiers fall back to [`Shape::Scatter`].
    pub fn from_name(name: &str) -> Shape {
        match name.trim().to_ascii_uppercase().as_str() {
            "HEART"     => Shape::Heart,
            "FLOWER"    => Shape::Flower,
            "SATURN"    => Shape::Saturn,
            "FIREWORKS" => Shape::Fireworks,
            other => {
                tracing::debug!(name = other, "unknown shape identifier, using scatter fallback");
                Shape::Scatter
            }
        }
    }

    /// Canonical upper-case identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Heart     => "HEART",
            Shape::Flower    => "FLOWER",
            Shape::Saturn    => "SATURN",
            Shape::Fireworks => "FIREWORKS",
            Shape::Scatter   => "SCATTER",
        }
    }

    /// Human-readable label for menus and the HUD.
    pub fn label(&self) -> &'static str {
        match self {
            Shape::Heart     => "Romantic Heart",
            Shape::Flower    => "Holo Flower",
            Shape::Saturn    => "Saturn Rings",
            Shape::Fireworks => "Grand Fireworks",
            Shape::Scatter   => "Scatter",
        }
    }
}

impl Default for Shape {
    fn default() -> Self { Shape::Heart }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Shape {
    fn from(name: String) -> Self { Shape::from_name(&name) }
}

impl From<Shape> for String {
    fn from(shape: Shape) -> Self { shape.name().to_string() }
}

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

pub const DEFAULT_PARTICLE_COUNT: usize = 8000;

/// Scale applied to the raw heart curve (which spans roughly ±17).
pub const HEART_SCALE:      f32 = 0.2;
/// Half-thickness of the heart along the depth axis.
pub const HEART_DEPTH:      f32 = 2.0;

pub const FLOWER_PETALS:    f32 = 4.0;
pub const FLOWER_AMPLITUDE: f32 = 3.0;
pub const FLOWER_BODY:      f32 = 1.5;
pub const FLOWER_FLATTEN:   f32 = 0.5;

pub const SATURN_RING_PROBABILITY: f64 = 0.6;
pub const SATURN_RING_INNER:  f32 = 3.5;
pub const SATURN_RING_OUTER:  f32 = 6.0;
/// Half-height of the ring's vertical jitter.
pub const SATURN_RING_JITTER: f32 = 0.1;
pub const SATURN_PLANET_RADIUS: f32 = 2.0;
/// Tilt about the axis perpendicular to the (x, y) plane.
pub const SATURN_TILT: f32 = PI / 6.0;

pub const FIREWORKS_RADIUS: f32 = 4.5;

/// Half-width of the fallback cube.
pub const SCATTER_HALF_WIDTH: f32 = 2.5;

// ════════════════════════════════════════════════════════════════════════════
// Generation
// ════════════════════════════════════════════════════════════════════════════

/// Generate `count` points for `shape` using the thread-local generator.
///
/// Two calls with the same arguments give statistically equivalent but not
/// identical clouds.
pub fn generate(count: usize, shape: Shape) -> Vec<Vec3> {
    generate_with(count, shape, &mut rand::thread_rng())
}

/// Generate `count` points for `shape` from an explicit random source.
pub fn generate_with<R: Rng + ?Sized>(count: usize, shape: Shape, rng: &mut R) -> Vec<Vec3> {
    (0..count).map(|_| sample_point(shape, rng)).collect()
}

/// Draw a single point of `shape`.
pub fn sample_point<R: Rng + ?Sized>(shape: Shape, rng: &mut R) -> Vec3 {
    match shape {
        Shape::Heart     => heart_point(rng),
        Shape::Flower    => flower_point(rng),
        Shape::Saturn    => saturn_point(rng),
        Shape::Fireworks => random_in_sphere(FIREWORKS_RADIUS, rng),
        Shape::Scatter   => scatter_point(rng),
    }
}

/// The raw (unscaled) heart curve at parameter `t`.
pub fn heart_curve(t: f32) -> Vec2 {
    let s = t.sin();
    Vec2::new(
        16.0 * s * s * s,
        13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos(),
    )
}

fn heart_point<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let t     = rng.gen_range(0.0..TAU);
    let curve = heart_curve(t) * HEART_SCALE;
    let depth = rng.gen_range(-HEART_DEPTH..HEART_DEPTH);
    Vec3::new(curve.x, curve.y, depth)
}

fn flower_point<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi   = rng.gen_range(0.0..PI);
    let r     = FLOWER_AMPLITUDE * (FLOWER_PETALS * theta).sin() + FLOWER_BODY;
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos() * FLOWER_FLATTEN,
    )
}

fn saturn_point<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let p = if rng.gen_bool(SATURN_RING_PROBABILITY) {
        // Ring lies in the x/z plane; y carries the thin jitter.
        let angle = rng.gen_range(0.0..TAU);
        let dist  = rng.gen_range(SATURN_RING_INNER..SATURN_RING_OUTER);
        let h     = rng.gen_range(-SATURN_RING_JITTER..SATURN_RING_JITTER);
        Vec3::new(angle.cos() * dist, h, angle.sin() * dist)
    } else {
        random_in_sphere(SATURN_PLANET_RADIUS, rng)
    };
    tilt_xy(p, SATURN_TILT)
}

/// Rotate the (x, y) components of `p` by `angle`; z is untouched.
pub fn tilt_xy(p: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos, p.z)
}

fn scatter_point<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let h = SCATTER_HALF_WIDTH;
    Vec3::new(rng.gen_range(-h..h), rng.gen_range(-h..h), rng.gen_range(-h..h))
}

/// Uniform-by-volume point inside a solid sphere of `radius`.
///
/// The direction comes from spherical coordinates with `φ = acos(2v − 1)`,
/// and the radius is scaled by the cube root of a uniform draw so the
/// density does not pile up at the centre.
pub fn random_in_sphere<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Vec3 {
    let u: f32 = rng.gen();
    let v: f32 = rng.gen();
    let w: f32 = rng.gen();
    let theta  = TAU * u;
    let phi    = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
    let r      = w.cbrt() * radius;
    let sin_phi = phi.sin();
    Vec3::new(
        r * sin_phi * theta.cos(),
        r * sin_phi * theta.sin(),
        r * phi.cos(),
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng { StdRng::seed_from_u64(0x5eed) }

    /// Undo the Saturn tilt and report whether the point came from the ring.
    fn saturn_is_ring(p: Vec3) -> bool {
        let q = tilt_xy(p, -SATURN_TILT);
        Vec2::new(q.x, q.z).length() >= SATURN_RING_INNER - 1e-3
    }

    #[test]
    fn every_shape_yields_requested_count() {
        let mut r = rng();
        for shape in Shape::ALL.iter().copied().chain([Shape::Scatter]) {
            for n in [0usize, 1, 17, 8000] {
                assert_eq!(generate_with(n, shape, &mut r).len(), n, "{} x {}", shape, n);
            }
        }
    }

    #[test]
    fn from_name_round_trips_and_falls_back() {
        for s in Shape::ALL {
            assert_eq!(Shape::from_name(s.name()), s);
        }
        assert_eq!(Shape::from_name("saturn"), Shape::Saturn);
        assert_eq!(Shape::from_name("DODECAHEDRON"), Shape::Scatter);
        assert_eq!(Shape::from_name(""), Shape::Scatter);
    }

    #[test]
    fn heart_points_lie_on_the_curve() {
        let mut r = rng();
        for p in generate_with(2000, Shape::Heart, &mut r) {
            let hx = (p.x / HEART_SCALE) as f64;
            let hy = (p.y / HEART_SCALE) as f64;
            let s  = (hx / 16.0).cbrt().clamp(-1.0, 1.0);
            let t1 = s.asin();
            let t2 = std::f64::consts::PI - t1;
            let curve_y = |t: f64| {
                13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos()
            };
            let err = (curve_y(t1) - hy).abs().min((curve_y(t2) - hy).abs());
            assert!(err < 0.05, "point {:?} off the heart curve by {}", p, err);
            assert!(p.z.abs() <= HEART_DEPTH);
        }
    }

    #[test]
    fn flower_stays_inside_petal_envelope() {
        let mut r = rng();
        let max_r = FLOWER_AMPLITUDE + FLOWER_BODY;
        for p in generate_with(5000, Shape::Flower, &mut r) {
            assert!(Vec2::new(p.x, p.y).length() <= max_r + 1e-4);
            assert!(p.z.abs() <= max_r * FLOWER_FLATTEN + 1e-4);
        }
    }

    #[test]
    fn saturn_ring_and_planet_regions() {
        let mut r = rng();
        for p in generate_with(10_000, Shape::Saturn, &mut r) {
            let q = tilt_xy(p, -SATURN_TILT);
            if saturn_is_ring(p) {
                let planar = Vec2::new(q.x, q.z).length();
                assert!(planar <= SATURN_RING_OUTER + 1e-3, "ring radius {}", planar);
                assert!(q.y.abs() <= SATURN_RING_JITTER + 1e-4);
            } else {
                assert!(q.length() <= SATURN_PLANET_RADIUS + 1e-4, "planet radius {}", q.length());
            }
        }
    }

    #[test]
    fn saturn_ring_fraction_is_sixty_percent() {
        let mut r = rng();
        let n = 20_000;
        let rings = generate_with(n, Shape::Saturn, &mut r)
            .into_iter()
            .filter(|p| saturn_is_ring(*p))
            .count();
        let frac = rings as f64 / n as f64;
        assert!((frac - 0.6).abs() < 0.02, "ring fraction {}", frac);
    }

    /// r³/R³ must be uniform on [0, 1] for a volume-uniform ball.
    fn assert_volume_uniform(points: &[Vec3], radius: f32) {
        let cubes: Vec<f64> = points.iter()
            .map(|p| ((p.length() / radius) as f64).powi(3))
            .collect();
        let n    = cubes.len() as f64;
        let mean = cubes.iter().sum::<f64>() / n;
        assert!((mean - 0.5).abs() < 0.02, "mean of r³/R³ = {}", mean);
        for q in [0.25, 0.5, 0.75] {
            let below = cubes.iter().filter(|&&c| c < q).count() as f64 / n;
            assert!((below - q).abs() < 0.02, "P(r³/R³ < {}) = {}", q, below);
        }
        assert!(cubes.iter().all(|&c| c <= 1.0 + 1e-4));
    }

    #[test]
    fn fireworks_uniform_by_volume() {
        let mut r = rng();
        let pts = generate_with(20_000, Shape::Fireworks, &mut r);
        assert_volume_uniform(&pts, FIREWORKS_RADIUS);
    }

    #[test]
    fn saturn_planet_uniform_by_volume() {
        let mut r = rng();
        let planet: Vec<Vec3> = generate_with(40_000, Shape::Saturn, &mut r)
            .into_iter()
            .filter(|p| !saturn_is_ring(*p))
            .map(|p| tilt_xy(p, -SATURN_TILT))
            .collect();
        assert!(planet.len() > 10_000);
        assert_volume_uniform(&planet, SATURN_PLANET_RADIUS);
    }

    #[test]
    fn scatter_fills_the_cube() {
        let mut r = rng();
        for p in generate_with(2000, Shape::Scatter, &mut r) {
            assert!(p.abs().max_element() <= SCATTER_HALF_WIDTH);
        }
    }

    #[test]
    fn regeneration_is_equivalent_but_not_identical() {
        let mut r = rng();
        let a = generate_with(8000, Shape::Fireworks, &mut r);
        let b = generate_with(8000, Shape::Fireworks, &mut r);
        assert_ne!(a, b);
        let mean_r = |v: &[Vec3]| v.iter().map(|p| p.length()).sum::<f32>() / v.len() as f32;
        assert!((mean_r(&a) - mean_r(&b)).abs() < 0.05);
    }

    #[test]
    fn tilt_leaves_depth_alone() {
        let p = tilt_xy(Vec3::new(1.0, 0.0, 3.0), SATURN_TILT);
        assert!((p.x - SATURN_TILT.cos()).abs() < 1e-6);
        assert!((p.y - SATURN_TILT.sin()).abs() < 1e-6);
        assert_eq!(p.z, 3.0);
    }
}
