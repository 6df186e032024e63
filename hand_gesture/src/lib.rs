//! # hand_gesture
//!
//! Turns per-frame hand landmarks into a single gesture scalar that drives
//! the particle field's scale.
//!
//! ## Landmarks → signal
//!
//! | Hands in frame | Landmarks used | Mapping |
//! |---|---|---|
//! | 0 | none | `(0, not tracking)` |
//! | 1 | thumb tip (4), index tip (8) | `clamp(raw × 8, 0.2, 1.5)` |
//! | 2+ | wrists (0) of the first two hands | `clamp((raw − 0.1) × 2.5, 0, 2)` |
//!
//! `raw` is the Euclidean distance in the normalized image (x, y) plane.
//!
//! ## Threads
//!
//! [`GestureInput`] runs camera capture and landmark inference on its own
//! thread and publishes into a [`SignalSlot`].  The render loop reads the
//! slot whenever it likes; it never waits for an inference in flight.
//!
//! ## Feature flags
//!
//! * (default): [`SimLandmarker`], keyboard-driven synthetic hands.
//! * `leap`: `LeapLandmarker`, landmarks from a LeapMotion controller.

pub mod landmarks;
pub mod signal;
pub mod vision;
pub mod sim;
#[cfg(feature = "leap")]
pub mod leap;
pub mod tracker;

pub use landmarks::{Hand, Landmark};
pub use signal::{hand_distance, pinch_distance, spread_distance, FrameGate, GestureSignal, SignalSlot};
pub use vision::{Camera, HandLandmarker, PacedCamera, VideoFrame, VisionError};
pub use sim::{SimInput, SimLandmarker};
#[cfg(feature = "leap")]
pub use leap::LeapLandmarker;
pub use tracker::{GestureInput, TrackerStatus};
