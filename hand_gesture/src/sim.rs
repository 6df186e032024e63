//! Keyboard-driven hand simulation.
//!
//! The visualizer window translates key presses into [`SimInput`] events
//! and sends them here over a channel; [`SimLandmarker`] drains them on each
//! detection and synthesises matching 21-point hands.  This decouples the
//! window event loop from the inference thread, the same way a hardware
//! landmarker would be decoupled.

use std::sync::mpsc::{Receiver, TryRecvError};

use crate::landmarks::{Hand, Landmark, INDEX_TIP, THUMB_TIP};
use crate::vision::{HandLandmarker, VideoFrame, VisionError};

/// Step applied per Widen/Narrow event, in normalized image units.
const SPREAD_STEP: f32 = 0.01;
const SPREAD_MAX:  f32 = 0.9;

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Cycle the number of simulated hands 0 → 1 → 2 → 0.
    CycleHands,
    /// Increase pinch (one hand) or wrist spread (two hands).
    Widen,
    /// Decrease pinch or wrist spread.
    Narrow,
    /// Make the next detection fail.
    FailNext,
}

/// Landmarker producing synthetic hands from [`SimInput`] events.
pub struct SimLandmarker {
    rx:        Receiver<SimInput>,
    hands:     u8,
    /// Thumb/index gap for one hand, wrist gap for two, in image units.
    spread:    f32,
    fail_next: bool,
}

impl SimLandmarker {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarker { rx, hands: 0, spread: 0.1, fail_next: false }
    }

    pub fn hand_count(&self) -> u8 { self.hands }

    pub fn spread(&self) -> f32 { self.spread }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::CycleHands => self.hands = (self.hands + 1) % 3,
            SimInput::Widen      => self.spread = (self.spread + SPREAD_STEP).min(SPREAD_MAX),
            SimInput::Narrow     => self.spread = (self.spread - SPREAD_STEP).max(0.0),
            SimInput::FailNext   => self.fail_next = true,
        }
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(input) => self.apply(input),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// A relaxed open hand with its wrist at `(x, y)`.
    fn open_hand(x: f32, y: f32) -> Hand {
        let wrist = Landmark::new(x, y, 0.0);
        Hand::from_tips(wrist, [
            Landmark::new(x - 0.10, y - 0.15, 0.0),
            Landmark::new(x - 0.04, y - 0.30, 0.0),
            Landmark::new(x,        y - 0.32, 0.0),
            Landmark::new(x + 0.04, y - 0.30, 0.0),
            Landmark::new(x + 0.08, y - 0.24, 0.0),
        ])
    }

    fn synthesise(&self) -> Vec<Hand> {
        match self.hands {
            0 => Vec::new(),
            1 => {
                let mut hand = Self::open_hand(0.5, 0.8);
                // Thumb and index tips straddle a common pinch point.
                let half = self.spread / 2.0;
                hand.landmarks[THUMB_TIP] = Landmark::new(0.5 - half, 0.5, 0.0);
                hand.landmarks[INDEX_TIP] = Landmark::new(0.5 + half, 0.5, 0.0);
                vec![hand]
            }
            _ => {
                let half = self.spread / 2.0;
                vec![Self::open_hand(0.5 - half, 0.8), Self::open_hand(0.5 + half, 0.8)]
            }
        }
    }
}

impl HandLandmarker for SimLandmarker {
    fn initialize(&mut self) -> Result<(), VisionError> {
        tracing::info!("simulated hand landmarker ready (H = hands, Up/Down = spread, X = fault)");
        Ok(())
    }

    fn detect(&mut self, _frame: &VideoFrame, _timestamp_ms: f64) -> Result<Vec<Hand>, VisionError> {
        self.drain();
        if self.fail_next {
            self.fail_next = false;
            return Err(VisionError::Detection("simulated detector fault".to_string()));
        }
        Ok(self.synthesise())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
