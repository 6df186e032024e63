//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SHAPE LABEL                                  tracker status │
//! │                                                              │
//! │                     · ·  particle field  · ·                 │
//! │                                                              │
//! │              [ AUTO DEMO MODE (NO HAND DETECTED) ]           │
//! │  key legend                                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Left-drag orbits the camera, the scroll wheel zooms.  Keys that steer the
//! hand simulator are forwarded straight to it; everything else comes back
//! to the app loop as [`AppCommand`]s.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use hand_gesture::SimInput;
use particle_shapes::Shape;

use crate::app::AppCommand;
use crate::error::AppError;
use crate::render::{vertical_gradient, Accumulator, FieldRenderer, OrbitCamera, RenderFrame};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const BG_TOP:       u32   = 0x0B0B1A;
const BG_BOTTOM:    u32   = 0x000000;
const PANEL_COLOR:  u32   = 0x0F1530;
const TITLE_COLOR:  u32   = 0xEEEEEE;
const STATUS_COLOR: u32   = 0x8FD18F;
const ERROR_COLOR:  u32   = 0xFF6B6B;
const BANNER_COLOR: u32   = 0xFFD700;
const LEGEND_COLOR: u32   = 0x888888;
const MARGIN:       usize = 12;
const GLYPH_W:      usize = 3;
const GLYPH_H:      usize = 5;
const LEGEND: &str =
    "1-4=shape  C=color  V=camera  H=hands  UP/DOWN=spread  X=fault  DRAG=orbit  WHEEL=zoom  Q=quit";

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    width:      usize,
    height:     usize,
    buf:        Vec<u32>,
    background: Vec<u32>,
    acc:        Accumulator,
    camera:     OrbitCamera,
    drag_from:  Option<(f32, f32)>,
    sim_tx:     Sender<SimInput>,
}

impl Visualizer {
    pub fn new(width: usize, height: usize, sim_tx: Sender<SimInput>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Gesture Particles",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            width,
            height,
            buf:        vec![0; width * height],
            background: vertical_gradient(width, height, BG_TOP, BG_BOTTOM),
            acc:        Accumulator::new(width, height),
            camera:     OrbitCamera::default(),
            drag_from:  None,
            sim_tx,
        })
    }

    /// Returns false once the window has been closed.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard and mouse.  Orbit/zoom and simulator keys are handled
    /// here; the rest is returned for the app loop.
    pub fn poll_input(&mut self) -> Vec<AppCommand> {
        let mut commands = Vec::new();
        if !self.window.is_open() {
            commands.push(AppCommand::Quit);
            return commands;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            commands.push(AppCommand::Quit);
        }
        for (key, shape) in [
            (Key::Key1, Shape::Heart),
            (Key::Key2, Shape::Flower),
            (Key::Key3, Shape::Saturn),
            (Key::Key4, Shape::Fireworks),
        ] {
            if one_shot(key) { commands.push(AppCommand::SelectShape(shape)); }
        }
        if one_shot(Key::C) { commands.push(AppCommand::CycleColor); }
        if one_shot(Key::V) { commands.push(AppCommand::ToggleCamera); }

        let mut sim = Vec::new();
        if one_shot(Key::H)  { sim.push(SimInput::CycleHands); }
        if one_shot(Key::X)  { sim.push(SimInput::FailNext); }
        if held(Key::Up)     { sim.push(SimInput::Widen); }
        if held(Key::Down)   { sim.push(SimInput::Narrow); }
        for input in sim {
            // Receiver is gone when a hardware landmarker is in use.
            let _ = self.sim_tx.send(input);
        }

        self.poll_orbit();
        commands
    }

    fn poll_orbit(&mut self) {
        let pos = self.window.get_mouse_pos(MouseMode::Discard);
        if self.window.get_mouse_down(MouseButton::Left) {
            if let (Some((x0, y0)), Some((x, y))) = (self.drag_from, pos) {
                self.camera.orbit(x - x0, y - y0, self.height);
            }
            self.drag_from = pos;
        } else {
            self.drag_from = None;
        }
        if let Some((_, dy)) = self.window.get_scroll_wheel() {
            if dy != 0.0 {
                self.camera.zoom(dy.signum());
            }
        }
    }

    // ── HUD ───────────────────────────────────────────────────────────────

    fn draw_hud(&mut self, frame: &RenderFrame<'_>) {
        let hud = &frame.hud;

        // Title, top-left, double size
        self.draw_label(&hud.title, MARGIN, MARGIN, TITLE_COLOR, 3);

        // Tracker status, top-right
        let status_color = if hud.error { ERROR_COLOR } else { STATUS_COLOR };
        let sw = text_width(&hud.status, 2);
        let sx = self.width.saturating_sub(sw + MARGIN);
        self.shade_rect(sx.saturating_sub(6), MARGIN - 6, sw + 12, GLYPH_H * 2 + 12, PANEL_COLOR, 0.6);
        self.draw_label(&hud.status, sx, MARGIN, status_color, 2);

        // Idle banner, bottom-centre
        if let Some(banner) = &hud.banner {
            let bw = text_width(banner, 2);
            let bx = self.width.saturating_sub(bw) / 2;
            let by = self.height.saturating_sub(60);
            self.shade_rect(bx.saturating_sub(10), by.saturating_sub(8), bw + 20, GLYPH_H * 2 + 16, PANEL_COLOR, 0.7);
            self.draw_label(banner, bx, by, BANNER_COLOR, 2);
        }

        self.draw_label(LEGEND, MARGIN, self.height.saturating_sub(MARGIN + GLYPH_H), LEGEND_COLOR, 1);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    /// Blend `color` over a rectangle with weight `t`.
    fn shade_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32, t: f32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                let i = row * self.width + col;
                self.buf[i] = blend(self.buf[i], color, t);
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    /// Minimal bitmap font, each glyph pixel drawn as a `scale`×`scale` block.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                        for dy in 0..scale {
                            for dx in 0..scale {
                                self.set_pixel(cx + col * scale + dx, y + row * scale + dy, color);
                            }
                        }
                    }
                }
            }
            cx += (GLYPH_W + 1) * scale;
            if cx + (GLYPH_W + 1) * scale > self.width { break; }
        }
    }
}

impl FieldRenderer for Visualizer {
    fn present(&mut self, frame: &RenderFrame<'_>) {
        if frame.auto_rotate && self.drag_from.is_none() {
            self.camera.auto_rotate(frame.dt);
        }

        self.acc.clear();
        self.acc.draw(&self.camera, frame);
        self.acc.resolve(&self.background, &mut self.buf);
        self.draw_hud(frame);

        if let Err(e) = self.window.update_with_buffer(&self.buf, self.width, self.height) {
            tracing::warn!(error = %e, "window update failed");
        }
    }
}

/// Pixel width of `text` at `scale`.
fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * (GLYPH_W + 1) * scale
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Blend two RGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
