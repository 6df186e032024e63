//! Top-level application state machine.
//!
//! `AppState` owns the `ParticleField`, the `AnimationEngine`, and the
//! `GestureInput` handle.  It applies UI commands, reads the latest gesture
//! each frame, and hands a `RenderFrame` to the renderer.

use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use hand_gesture::{GestureInput, GestureSignal, PacedCamera, SimInput, TrackerStatus};
#[cfg(not(feature = "leap"))]
use hand_gesture::SimLandmarker;
#[cfg(feature = "leap")]
use hand_gesture::LeapLandmarker;
use particle_shapes::Shape;

use crate::animation::{AnimationEngine, Mode, ParticleField};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::render::{
    next_palette_color, parse_hex_color, ColorError, FieldRenderer, Hud, PointStyle, RenderFrame,
    DEFAULT_COLOR,
};
use crate::visualizer::Visualizer;

pub const IDLE_BANNER_NO_HAND:    &str = "AUTO DEMO MODE (NO HAND DETECTED)";
pub const IDLE_BANNER_CAMERA_OFF: &str = "AUTO DEMO MODE (CAMERA OFF)";

// ════════════════════════════════════════════════════════════════════════════
// AppCommand
// ════════════════════════════════════════════════════════════════════════════

/// A UI action from the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppCommand {
    SelectShape(Shape),
    CycleColor,
    ToggleCamera,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── particles ────────────────────────────────────────────────────────
    field:   ParticleField,
    engine:  AnimationEngine,

    // ── gesture input ────────────────────────────────────────────────────
    gesture:        GestureInput,
    camera_enabled: bool,

    // ── look ─────────────────────────────────────────────────────────────
    color:   String,
    style:   PointStyle,

    // ── last tick ────────────────────────────────────────────────────────
    mode:    Mode,
    dt:      f32,
}

impl AppState {
    pub fn new(cfg: &AppConfig, gesture: GestureInput) -> Self {
        let mut app = AppState {
            field:          ParticleField::new(cfg.shape, cfg.particle_count),
            engine:         AnimationEngine::new(),
            gesture,
            camera_enabled: false,
            color:          DEFAULT_COLOR.to_string(),
            style:          PointStyle::default(),
            mode:           Mode::Idle,
            dt:             0.0,
        };
        if let Err(e) = app.set_color(&cfg.color) {
            tracing::warn!(error = %e, fallback = DEFAULT_COLOR, "ignoring configured color");
        }
        app.set_camera_enabled(cfg.camera_enabled);
        tracing::info!(shape = %cfg.shape, count = cfg.particle_count, "particle field ready");
        app
    }

    // ── commands ──────────────────────────────────────────────────────────

    /// Apply `cmd`.  Returns false when the app should exit.
    pub fn handle_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::SelectShape(shape) => self.select_shape(shape),
            AppCommand::CycleColor         => self.cycle_color(),
            AppCommand::ToggleCamera       => self.set_camera_enabled(!self.camera_enabled),
            AppCommand::Quit               => return false,
        }
        true
    }

    /// Regenerate the field for `shape`.  Re-selecting the current shape
    /// keeps the existing cloud.
    pub fn select_shape(&mut self, shape: Shape) {
        if shape == self.field.shape() {
            tracing::debug!(shape = %shape, "shape already active");
            return;
        }
        self.field.set_shape(shape);
    }

    pub fn set_color(&mut self, hex: &str) -> Result<(), ColorError> {
        self.style.color = parse_hex_color(hex)?;
        self.color = hex.trim().to_string();
        Ok(())
    }

    pub fn cycle_color(&mut self) {
        let next = next_palette_color(&self.color);
        // Palette entries always parse.
        if self.set_color(next).is_ok() {
            tracing::info!(color = next, "particle color changed");
        }
    }

    /// Switching off resets the gesture to `(0, false)` before returning.
    pub fn set_camera_enabled(&mut self, enabled: bool) {
        self.camera_enabled = enabled;
        self.gesture.set_enabled(enabled);
    }

    // ── per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self, dt: f32) -> Mode {
        let signal = self.gesture.signal();
        self.mode = self.engine.tick(dt, signal, &mut self.field);
        self.dt = dt;
        self.mode
    }

    pub fn hud(&self) -> Hud {
        let status = if self.camera_enabled { self.gesture.status() } else { TrackerStatus::Disabled };
        let banner = match self.mode {
            Mode::Tracking => None,
            Mode::Idle if self.camera_enabled => Some(IDLE_BANNER_NO_HAND.to_string()),
            Mode::Idle => Some(IDLE_BANNER_CAMERA_OFF.to_string()),
        };
        Hud {
            title:  self.field.shape().label().to_string(),
            status: status.label().to_string(),
            banner,
            error:  status.is_error(),
        }
    }

    pub fn render_frame(&self) -> RenderFrame<'_> {
        RenderFrame {
            positions:   self.field.current(),
            revision:    self.field.revision(),
            rotation:    self.engine.rotation(),
            style:       self.style,
            auto_rotate: self.mode == Mode::Idle,
            dt:          self.dt,
            hud:         self.hud(),
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn field(&self)          -> &ParticleField   { &self.field }
    pub fn engine(&self)         -> &AnimationEngine { &self.engine }
    pub fn signal(&self)         -> GestureSignal    { self.gesture.signal() }
    pub fn color(&self)          -> &str             { &self.color }
    pub fn camera_enabled(&self) -> bool             { self.camera_enabled }
    pub fn mode(&self)           -> Mode             { self.mode }
}

/// Advance `app` by `dt` and draw it.
pub fn frame<R: FieldRenderer>(app: &mut AppState, renderer: &mut R, dt: f32) -> Mode {
    let mode = app.tick(dt);
    renderer.present(&app.render_frame());
    mode
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

#[cfg(not(feature = "leap"))]
fn landmarker(sim_rx: Receiver<SimInput>) -> SimLandmarker {
    SimLandmarker::new(sim_rx)
}

#[cfg(feature = "leap")]
fn landmarker(_sim_rx: Receiver<SimInput>) -> LeapLandmarker {
    LeapLandmarker::new()
}

/// Run the full application.
///
/// Creates the window, the gesture input (keyboard simulation by default,
/// hardware with `--features leap`), and drives the tick/render loop at the
/// window's refresh rate.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;

    // ── Sim hand channel ──────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let gesture = GestureInput::new(PacedCamera::new(cfg.camera_fps), landmarker(sim_rx));

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(cfg.window_width, cfg.window_height, sim_tx)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(&cfg, gesture);

    // ── Main loop ─────────────────────────────────────────────────────────
    let mut last = Instant::now();
    'frames: while vis.is_open() {
        for cmd in vis.poll_input() {
            if !app.handle_command(cmd) { break 'frames; }
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        frame(&mut app, &mut vis, dt);
    }

    tracing::info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{target_scale, IDLE_AMPLITUDE, IDLE_RATE};
    use hand_gesture::SimLandmarker;
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    fn make_app(camera_enabled: bool) -> (AppState, Sender<SimInput>) {
        let cfg = AppConfig { particle_count: 600, camera_enabled, ..AppConfig::default() };
        let (tx, rx) = mpsc::channel();
        let camera = PacedCamera::new(200.0).with_poll_interval(Duration::from_millis(1));
        let gesture = GestureInput::new(camera, SimLandmarker::new(rx));
        (AppState::new(&cfg, gesture), tx)
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[derive(Default)]
    struct Recorder {
        frames:    usize,
        lengths:   Vec<usize>,
        revisions: Vec<u64>,
        last_hud:  Option<Hud>,
    }

    impl FieldRenderer for Recorder {
        fn present(&mut self, frame: &RenderFrame<'_>) {
            self.frames += 1;
            self.lengths.push(frame.positions.len());
            self.revisions.push(frame.revision);
            self.last_hud = Some(frame.hud.clone());
        }
    }

    #[test]
    fn starts_with_configured_field() {
        let (app, _tx) = make_app(false);
        assert_eq!(app.field().shape(), Shape::Heart);
        assert_eq!(app.field().len(), 600);
        assert_eq!(app.color(), DEFAULT_COLOR);
        assert_eq!(app.signal(), GestureSignal::IDLE);
    }

    #[test]
    fn camera_off_hud() {
        let (mut app, _tx) = make_app(false);
        app.tick(0.016);
        let hud = app.hud();
        assert_eq!(hud.title, "Romantic Heart");
        assert_eq!(hud.status, "CAMERA OFF");
        assert_eq!(hud.banner.as_deref(), Some(IDLE_BANNER_CAMERA_OFF));
        assert!(!hud.error);
        assert!(app.render_frame().auto_rotate);
    }

    #[test]
    fn shape_command_regenerates_same_count() {
        let (mut app, _tx) = make_app(false);
        assert!(app.handle_command(AppCommand::SelectShape(Shape::Saturn)));
        assert_eq!(app.field().shape(), Shape::Saturn);
        assert_eq!(app.field().len(), 600);
    }

    #[test]
    fn reselecting_shape_keeps_cloud() {
        let (mut app, _tx) = make_app(false);
        let before = app.field().initial().to_vec();
        let rev = app.field().revision();
        app.select_shape(Shape::Heart);
        assert_eq!(app.field().initial(), &before[..]);
        assert_eq!(app.field().revision(), rev);
    }

    #[test]
    fn quit_command_stops() {
        let (mut app, _tx) = make_app(false);
        assert!(!app.handle_command(AppCommand::Quit));
    }

    #[test]
    fn color_cycles_through_palette() {
        let (mut app, _tx) = make_app(false);
        app.handle_command(AppCommand::CycleColor);
        assert_eq!(app.color(), "#f472b6");
        assert_eq!(app.render_frame().style.color, 0xF472B6);
    }

    #[test]
    fn bad_color_is_rejected_and_kept() {
        let (mut app, _tx) = make_app(false);
        assert!(app.set_color("teal").is_err());
        assert_eq!(app.color(), DEFAULT_COLOR);
    }

    #[test]
    fn renderer_sees_stable_length_across_shape_changes() {
        let (mut app, _tx) = make_app(false);
        let mut rec = Recorder::default();
        for shape in Shape::ALL {
            app.select_shape(shape);
            frame(&mut app, &mut rec, 0.016);
        }
        assert_eq!(rec.frames, 4);
        assert!(rec.lengths.iter().all(|&n| n == 600));
        assert!(rec.revisions.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(rec.last_hud.unwrap().title, "Grand Fireworks");
    }

    #[test]
    fn hand_drives_scale_and_camera_off_resets_it() {
        let (mut app, tx) = make_app(true);
        wait_until(|| app.gesture.status() == TrackerStatus::Live);
        assert_eq!(app.hud().status, "LIVE");

        // One simulated hand at the default 0.1 pinch gap → distance 0.8.
        tx.send(SimInput::CycleHands).unwrap();
        wait_until(|| app.signal().is_tracking);
        let signal = app.signal();
        assert!((signal.distance - 0.8).abs() < 1e-4);

        assert_eq!(app.tick(0.016), Mode::Tracking);
        assert_eq!(app.engine().state().target_scale, target_scale(signal, 0.0));
        assert!(app.hud().banner.is_none());
        assert!(!app.render_frame().auto_rotate);

        app.handle_command(AppCommand::ToggleCamera);
        assert_eq!(app.signal(), GestureSignal::IDLE);
        assert_eq!(app.tick(0.016), Mode::Idle);
        let t = app.engine().state().elapsed;
        assert_eq!(app.engine().state().target_scale, 1.0 + (t * IDLE_RATE).sin() as f32 * IDLE_AMPLITUDE);
        assert_eq!(app.hud().status, "CAMERA OFF");
    }

    #[test]
    fn no_hand_banner_while_live() {
        let (mut app, _tx) = make_app(true);
        wait_until(|| app.gesture.status() == TrackerStatus::Live);
        app.tick(0.016);
        assert_eq!(app.hud().banner.as_deref(), Some(IDLE_BANNER_NO_HAND));
        app.set_camera_enabled(false);
    }
}
