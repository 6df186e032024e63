//! Point-cloud rendering math, independent of any window.
//!
//! A [`FieldRenderer`] receives one [`RenderFrame`] per tick.  The software
//! path here projects each particle through an orbiting perspective camera,
//! attenuates it with linear fog, and adds it into a floating-point
//! accumulation buffer (additive blending), which is then resolved over the
//! background into packed `0RGB` pixels for `minifb`.

use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Mat4, Vec3, Vec4Swizzles};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

pub const POINT_SIZE:      f32 = 0.08;
pub const POINT_OPACITY:   f32 = 0.8;
pub const FOG_NEAR:        f32 = 10.0;
pub const FOG_FAR:         f32 = 40.0;
pub const FOV_Y_DEGREES:   f32 = 45.0;
pub const CAMERA_DISTANCE: f32 = 15.0;
pub const NEAR_PLANE:      f32 = 0.1;
pub const FAR_PLANE:       f32 = 1000.0;
pub const MIN_DISTANCE:    f32 = 2.0;
pub const MAX_DISTANCE:    f32 = 60.0;
/// Auto-rotate speed; 1.0 is one orbit per 60 s.
pub const AUTO_ROTATE_SPEED: f32 = 0.5;
/// Per scroll notch.
pub const ZOOM_STEP:       f32 = 0.95;

pub const DEFAULT_COLOR: &str = "#60a5fa";

/// Colors cycled with the `C` key.
pub const PALETTE: [&str; 7] = [
    "#60a5fa", // sky blue
    "#f472b6", // pink
    "#a78bfa", // violet
    "#34d399", // emerald
    "#fbbf24", // amber
    "#f87171", // coral
    "#ffffff",
];

// ════════════════════════════════════════════════════════════════════════════
// Color
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("color {0:?} must start with '#'")]
    MissingHash(String),
    #[error("color {0:?} must have 3 or 6 hex digits")]
    BadLength(String),
    #[error("color {0:?} has a non-hex digit")]
    BadDigit(String),
}

/// Parse `#rgb` or `#rrggbb` into packed `0x00RRGGBB`.
pub fn parse_hex_color(s: &str) -> Result<u32, ColorError> {
    let s = s.trim();
    let hex = s.strip_prefix('#').ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::BadDigit(s.to_string()));
    }
    let value = u32::from_str_radix(hex, 16).map_err(|_| ColorError::BadDigit(s.to_string()))?;
    match hex.len() {
        6 => Ok(value),
        3 => {
            let r = (value >> 8) & 0xF;
            let g = (value >> 4) & 0xF;
            let b =  value       & 0xF;
            Ok((r * 0x11) << 16 | (g * 0x11) << 8 | b * 0x11)
        }
        _ => Err(ColorError::BadLength(s.to_string())),
    }
}

/// The palette entry after `current` (case-insensitive), or the first one.
pub fn next_palette_color(current: &str) -> &'static str {
    let pos = PALETTE.iter().position(|c| c.eq_ignore_ascii_case(current.trim()));
    match pos {
        Some(i) => PALETTE[(i + 1) % PALETTE.len()],
        None    => PALETTE[0],
    }
}

fn unpack(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xFF) as f32,
        ((rgb >>  8) & 0xFF) as f32,
        ( rgb        & 0xFF) as f32,
    )
}

fn pack(c: Vec3) -> u32 {
    let c = c.clamp(Vec3::ZERO, Vec3::splat(255.0));
    (c.x as u32) << 16 | (c.y as u32) << 8 | c.z as u32
}

// ════════════════════════════════════════════════════════════════════════════
// RenderFrame / FieldRenderer
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    /// World-space point size, attenuated by distance.
    pub size:    f32,
    /// Packed `0x00RRGGBB`.
    pub color:   u32,
    pub opacity: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        PointStyle { size: POINT_SIZE, color: 0x60A5FA, opacity: POINT_OPACITY }
    }
}

/// Text overlaid on the frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hud {
    pub title:  String,
    pub status: String,
    /// Shown only while the idle animation is running.
    pub banner: Option<String>,
    pub error:  bool,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct RenderFrame<'a> {
    pub positions:   &'a [Vec3],
    /// Changes whenever `positions` changes.
    pub revision:    u64,
    /// Euler angles (x, y, z) applied to the whole field.
    pub rotation:    Vec3,
    pub style:       PointStyle,
    pub auto_rotate: bool,
    /// Seconds since the previous frame, for camera auto-rotation.
    pub dt:          f32,
    pub hud:         Hud,
}

pub trait FieldRenderer {
    fn present(&mut self, frame: &RenderFrame<'_>);
}

// ════════════════════════════════════════════════════════════════════════════
// OrbitCamera
// ════════════════════════════════════════════════════════════════════════════

/// Perspective camera orbiting the origin.
///
/// Spherical coordinates: `polar` from +Y, `azimuth` about +Y from +Z.  The
/// default sits on +Z at distance 15, looking at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub azimuth:  f32,
    pub polar:    f32,
    pub distance: f32,
    pub fov_y:    f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera {
            azimuth:  0.0,
            polar:    PI / 2.0,
            distance: CAMERA_DISTANCE,
            fov_y:    FOV_Y_DEGREES.to_radians(),
        }
    }
}

/// A particle on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x:     f32,
    pub y:     f32,
    /// Distance along the view axis.
    pub depth: f32,
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        Vec3::new(sp * sa, cp, sp * ca) * self.distance
    }

    pub fn view_projection(&self, width: usize, height: usize) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let proj = Mat4::perspective_rh(self.fov_y, aspect, NEAR_PLANE, FAR_PLANE);
        let view = Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    /// Drag by `(dx, dy)` pixels; a full-height drag is one full turn.
    pub fn orbit(&mut self, dx: f32, dy: f32, height: usize) {
        let per_px = TAU / height.max(1) as f32;
        self.azimuth -= dx * per_px;
        self.polar = (self.polar - dy * per_px).clamp(0.01, PI - 0.01);
    }

    /// Positive `notches` zoom in.
    pub fn zoom(&mut self, notches: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(notches)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn auto_rotate(&mut self, dt: f32) {
        self.azimuth += TAU / 60.0 * AUTO_ROTATE_SPEED * dt;
    }
}

/// Project `p` (already in world space) through `view_proj`.
/// Points behind the near plane or outside the viewport return `None`.
pub fn project(view_proj: &Mat4, p: Vec3, width: usize, height: usize) -> Option<Projected> {
    let clip = *view_proj * p.extend(1.0);
    if clip.w <= NEAR_PLANE {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    if !(-1.0..=1.0).contains(&ndc.x) || !(-1.0..=1.0).contains(&ndc.y) {
        return None;
    }
    Some(Projected {
        x:     (ndc.x + 1.0) * 0.5 * width as f32,
        y:     (1.0 - ndc.y) * 0.5 * height as f32,
        depth: clip.w,
    })
}

/// On-screen diameter in pixels for a world-space point `size` at `depth`.
pub fn point_size_px(size: f32, depth: f32, height: usize) -> f32 {
    size * (height as f32 * 0.5) / depth.max(NEAR_PLANE)
}

/// Linear fog: 1 at `FOG_NEAR` or closer, 0 at `FOG_FAR` or beyond.
pub fn fog_factor(depth: f32) -> f32 {
    ((FOG_FAR - depth) / (FOG_FAR - FOG_NEAR)).clamp(0.0, 1.0)
}

pub fn model_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

// ════════════════════════════════════════════════════════════════════════════
// Accumulator: additive point splats
// ════════════════════════════════════════════════════════════════════════════

pub struct Accumulator {
    width:  usize,
    height: usize,
    light:  Vec<Vec3>,
}

impl Accumulator {
    pub fn new(width: usize, height: usize) -> Self {
        Accumulator { width, height, light: vec![Vec3::ZERO; width * height] }
    }

    pub fn clear(&mut self) {
        self.light.fill(Vec3::ZERO);
    }

    pub fn at(&self, x: usize, y: usize) -> Vec3 {
        self.light[y * self.width + x]
    }

    /// Add a square splat of diameter `size_px` centered on `(x, y)`.
    ///
    /// Sub-pixel points land on one pixel with intensity scaled by their
    /// area, so total light is conserved as points shrink with distance.
    pub fn splat(&mut self, x: f32, y: f32, size_px: f32, rgb: Vec3) {
        let side = size_px.round().max(1.0);
        let weight = (size_px * size_px / (side * side)).min(1.0);
        let side = side as i64;
        let x0 = (x - side as f32 * 0.5).round() as i64;
        let y0 = (y - side as f32 * 0.5).round() as i64;
        for py in y0.max(0)..(y0 + side).min(self.height as i64) {
            for px in x0.max(0)..(x0 + side).min(self.width as i64) {
                self.light[py as usize * self.width + px as usize] += rgb * weight;
            }
        }
    }

    /// Draw every particle in `frame` through `camera`.
    pub fn draw(&mut self, camera: &OrbitCamera, frame: &RenderFrame<'_>) -> usize {
        let mvp = camera.view_projection(self.width, self.height) * model_matrix(frame.rotation);
        let base = unpack(frame.style.color) * frame.style.opacity;
        let mut drawn = 0;
        for &p in frame.positions {
            if let Some(s) = project(&mvp, p, self.width, self.height) {
                let size = point_size_px(frame.style.size, s.depth, self.height);
                self.splat(s.x, s.y, size, base * fog_factor(s.depth));
                drawn += 1;
            }
        }
        drawn
    }

    /// Add accumulated light over `background` into packed pixels.
    pub fn resolve(&self, background: &[u32], out: &mut [u32]) {
        for ((o, &bg), &light) in out.iter_mut().zip(background).zip(&self.light) {
            *o = pack(unpack(bg) + light);
        }
    }
}

/// Vertical two-stop gradient, top to bottom.
pub fn vertical_gradient(width: usize, height: usize, top: u32, bottom: u32) -> Vec<u32> {
    let (a, b) = (unpack(top), unpack(bottom));
    let mut buf = Vec::with_capacity(width * height);
    for row in 0..height {
        let t = row as f32 / height.saturating_sub(1).max(1) as f32;
        buf.extend(std::iter::repeat(pack(a.lerp(b, t))).take(width));
    }
    buf
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_hex_color("#60a5fa"), Ok(0x60A5FA));
        assert_eq!(parse_hex_color(" #FFF "), Ok(0xFFFFFF));
        assert_eq!(parse_hex_color("#1a2"), Ok(0x11AA22));
    }

    #[test]
    fn rejects_bad_colors() {
        assert!(matches!(parse_hex_color("60a5fa"), Err(ColorError::MissingHash(_))));
        assert!(matches!(parse_hex_color("#60a5"), Err(ColorError::BadLength(_))));
        assert!(matches!(parse_hex_color("#zzzzzz"), Err(ColorError::BadDigit(_))));
        assert!(matches!(parse_hex_color("#+12345"), Err(ColorError::BadDigit(_))));
    }

    #[test]
    fn palette_is_valid_and_cycles() {
        for c in PALETTE {
            assert!(parse_hex_color(c).is_ok(), "{c}");
        }
        assert_eq!(next_palette_color(DEFAULT_COLOR), PALETTE[1]);
        assert_eq!(next_palette_color("#FFFFFF"), PALETTE[0]);
        assert_eq!(next_palette_color("#123456"), PALETTE[0]);
    }

    #[test]
    fn default_camera_sits_on_z() {
        let eye = OrbitCamera::default().eye();
        assert!((eye - Vec3::new(0.0, 0.0, 15.0)).length() < 1e-4);
    }

    #[test]
    fn origin_projects_to_center() {
        let cam = OrbitCamera::default();
        let vp = cam.view_projection(800, 600);
        let p = project(&vp, Vec3::ZERO, 800, 600).unwrap();
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
        assert!((p.depth - 15.0).abs() < 1e-3);
    }

    #[test]
    fn up_is_up_on_screen() {
        let vp = OrbitCamera::default().view_projection(800, 600);
        let p = project(&vp, Vec3::new(0.0, 1.0, 0.0), 800, 600).unwrap();
        assert!(p.y < 300.0);
    }

    #[test]
    fn behind_camera_is_culled() {
        let vp = OrbitCamera::default().view_projection(800, 600);
        assert!(project(&vp, Vec3::new(0.0, 0.0, 20.0), 800, 600).is_none());
    }

    #[test]
    fn fog_and_size_fall_off_with_depth() {
        assert_eq!(fog_factor(5.0), 1.0);
        assert_eq!(fog_factor(45.0), 0.0);
        assert!((fog_factor(25.0) - 0.5).abs() < 1e-6);
        assert!(point_size_px(POINT_SIZE, 10.0, 600) > point_size_px(POINT_SIZE, 20.0, 600));
    }

    #[test]
    fn orbit_clamps_polar_and_zoom_clamps_distance() {
        let mut cam = OrbitCamera::default();
        cam.orbit(0.0, 10_000.0, 600);
        assert!(cam.polar > 0.0);
        cam.zoom(1_000.0);
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(-1_000.0);
        assert_eq!(cam.distance, MAX_DISTANCE);
    }

    #[test]
    fn auto_rotate_turns_once_per_two_minutes() {
        let mut cam = OrbitCamera::default();
        cam.auto_rotate(120.0);
        assert!((cam.azimuth - TAU).abs() < 1e-4);
    }

    #[test]
    fn splats_add_up() {
        let mut acc = Accumulator::new(4, 4);
        acc.splat(1.5, 1.5, 1.0, Vec3::splat(100.0));
        acc.splat(1.5, 1.5, 1.0, Vec3::splat(100.0));
        assert_eq!(acc.at(1, 1), Vec3::splat(200.0));

        let mut out = vec![0; 16];
        acc.resolve(&vec![0x000080; 16], &mut out);
        // Saturates instead of wrapping.
        assert_eq!(out[5], 0xC8C8FF);
        assert_eq!(out[0], 0x000080);
    }

    #[test]
    fn tiny_splat_is_dimmed_by_area() {
        let mut acc = Accumulator::new(3, 3);
        acc.splat(1.5, 1.5, 0.5, Vec3::splat(100.0));
        assert!((acc.at(1, 1).x - 25.0).abs() < 1e-4);
    }

    #[test]
    fn offscreen_splat_is_clipped() {
        let mut acc = Accumulator::new(2, 2);
        acc.splat(-10.0, -10.0, 3.0, Vec3::ONE);
        acc.splat(50.0, 1.0, 3.0, Vec3::ONE);
        assert_eq!(acc.at(0, 0), Vec3::ZERO);
    }

    #[test]
    fn draw_counts_visible_points() {
        let mut acc = Accumulator::new(64, 48);
        let positions = [Vec3::ZERO, Vec3::new(0.0, 0.0, 50.0)];
        let frame = RenderFrame {
            positions:   &positions,
            revision:    1,
            rotation:    Vec3::ZERO,
            style:       PointStyle::default(),
            auto_rotate: false,
            dt:          0.0,
            hud:         Hud::default(),
        };
        assert_eq!(acc.draw(&OrbitCamera::default(), &frame), 1);
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let g = vertical_gradient(2, 3, 0x000000, 0x0000FF);
        assert_eq!(g.len(), 6);
        assert_eq!(g[0], 0x000000);
        assert_eq!(g[5], 0x0000FF);
    }
}
