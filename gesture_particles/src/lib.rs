//! # gesture_particles
//!
//! A particle field that reshapes itself into procedural silhouettes and
//! breathes with your hands.
//!
//! ## Gesture → scale mapping
//!
//! | Hands in view | Measurement | Distance |
//! |---|---|---|
//! | none | n/a | idle breathing, `1 + 0.2·sin(0.8·t)` |
//! | one | thumb tip ↔ index tip | `clamp(8·d, 0.2, 1.5)` |
//! | two | wrist ↔ wrist | `clamp(2.5·(d − 0.1), 0, 2)` |
//!
//! The field scales toward `0.5 + 2·distance` with a first-order lag.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: keyboard keys synthesise hands.
//! * `leap`: **Hardware mode**: hands come from a LeapMotion controller.
//!
//! ### Keyboard
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`4` | Heart / Flower / Saturn / Fireworks |
//! | `C` | Next particle color |
//! | `V` | Camera input on/off |
//! | `H` | Simulated hands 0 → 1 → 2 |
//! | `Up` / `Down` (hold) | Widen / narrow the simulated pinch or spread |
//! | `X` | Fail the next simulated detection |
//! | `Q` / `Esc` | Quit |
//!
//! Left-drag orbits the view; the scroll wheel zooms.

pub mod animation;
pub mod render;
pub mod config;
pub mod error;
pub mod visualizer;
pub mod app;

pub use animation::{AnimationEngine, AnimationState, Mode, ParticleField};
pub use app::{run, AppCommand, AppState};
pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use render::{FieldRenderer, RenderFrame};
