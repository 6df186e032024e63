//! Gesture signal: landmark geometry → `(distance, tracking)`, plus the
//! single-slot cell the inference thread publishes into.

use std::sync::{Mutex, MutexGuard};

use crate::landmarks::{Hand, Landmark, INDEX_TIP, THUMB_TIP, WRIST};
use crate::vision::VisionError;

// ════════════════════════════════════════════════════════════════════════════
// GestureSignal
// ════════════════════════════════════════════════════════════════════════════

/// Latest gesture reading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureSignal {
    /// Normalised hand/finger separation; `0.0` whenever not tracking.
    pub distance:    f32,
    /// True iff the latest inference found at least one hand.
    pub is_tracking: bool,
}

impl GestureSignal {
    /// No hand in view (also the state after the camera is disabled).
    pub const IDLE: GestureSignal = GestureSignal { distance: 0.0, is_tracking: false };

    pub fn tracking(distance: f32) -> Self {
        GestureSignal { distance, is_tracking: true }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Distance mapping
// ════════════════════════════════════════════════════════════════════════════

/// Map a two-hand wrist separation to the gesture range `[0, 2]`.
pub fn spread_distance(raw: f64) -> f32 {
    ((raw - 0.1) * 2.5).clamp(0.0, 2.0) as f32
}

/// Map a one-hand thumb/index separation to the gesture range `[0.2, 1.5]`.
pub fn pinch_distance(raw: f64) -> f32 {
    (raw * 8.0).clamp(0.2, 1.5) as f32
}

fn landmark(hand: &Hand, index: usize) -> Result<&Landmark, VisionError> {
    hand.get(index).ok_or(VisionError::Malformed { index, len: hand.len() })
}

fn finite(raw: f64) -> Result<f64, VisionError> {
    if raw.is_finite() { Ok(raw) } else { Err(VisionError::NonFinite) }
}

/// Compute the gesture signal for one inference result.
///
/// Only the first two hands are considered, in the order the detector
/// reported them.  A hand missing a required landmark, or one whose
/// coordinates give a NaN or infinite distance, is an error; callers should
/// keep their previous signal in that case.
pub fn hand_distance(hands: &[Hand]) -> Result<GestureSignal, VisionError> {
    match hands {
        [] => Ok(GestureSignal::IDLE),
        [hand] => {
            let raw = landmark(hand, THUMB_TIP)?.planar_distance(landmark(hand, INDEX_TIP)?);
            Ok(GestureSignal::tracking(pinch_distance(finite(raw)?)))
        }
        [first, second, ..] => {
            let raw = landmark(first, WRIST)?.planar_distance(landmark(second, WRIST)?);
            Ok(GestureSignal::tracking(spread_distance(finite(raw)?)))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameGate: skip frames whose timestamp was already processed
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct FrameGate {
    last: Option<f64>,
}

impl FrameGate {
    pub fn new() -> Self { FrameGate::default() }

    /// Returns true (and remembers `timestamp`) if this frame is new.
    pub fn admit(&mut self, timestamp: f64) -> bool {
        if self.last == Some(timestamp) {
            return false;
        }
        self.last = Some(timestamp);
        true
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SignalSlot: last-write-wins cell shared by inference and render threads
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct SlotState {
    signal: GestureSignal,
    epoch:  u64,
}

/// Single-value cell holding the freshest [`GestureSignal`].
///
/// Publishers tag each write with the epoch they were started under.
/// [`SignalSlot::reset`] clears the value and advances the epoch in one
/// step, so a write from an inference that began before the reset is
/// dropped instead of overwriting the cleared value.
#[derive(Debug, Default)]
pub struct SignalSlot {
    inner: Mutex<SlotState>,
}

impl SignalSlot {
    pub fn new() -> Self { SignalSlot::default() }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        // The state is plain Copy data; a panicking writer cannot leave it torn.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The most recently published signal.
    pub fn load(&self) -> GestureSignal { self.state().signal }

    pub fn epoch(&self) -> u64 { self.state().epoch }

    /// Store `signal` if `epoch` is current.  Returns whether it was stored.
    pub fn publish(&self, epoch: u64, signal: GestureSignal) -> bool {
        let mut state = self.state();
        if state.epoch != epoch {
            return false;
        }
        state.signal = signal;
        true
    }

    /// Clear to [`GestureSignal::IDLE`] and invalidate all outstanding
    /// publishers.  Returns the new epoch.
    pub fn reset(&self) -> u64 {
        let mut state = self.state();
        state.signal = GestureSignal::IDLE;
        state.epoch += 1;
        state.epoch
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
