//! Boundary to the vision collaborator: camera capture and the hand
//! landmark model.
//!
//! Both halves are traits so the inference thread doesn't care whether
//! landmarks come from a real detector, a LeapMotion controller, or the
//! keyboard simulator.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::landmarks::Hand;

// ════════════════════════════════════════════════════════════════════════════
// VisionError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error, PartialEq)]
pub enum VisionError {
    /// The landmark model could not be loaded.  Terminal for the session.
    #[error("hand landmark model failed to load: {0}")]
    ModelLoad(String),

    /// Camera permission denied or device unavailable.
    #[error("camera access denied: {0}")]
    CameraDenied(String),

    /// A single inference call failed; the next frame may succeed.
    #[error("hand detection failed: {0}")]
    Detection(String),

    /// A detected hand had too few landmarks for the gesture formula.
    #[error("hand has {len} landmarks, needed index {index}")]
    Malformed { index: usize, len: usize },

    /// Landmark coordinates produced a NaN or infinite distance.
    #[error("non-finite landmark distance")]
    NonFinite,
}

// ════════════════════════════════════════════════════════════════════════════
// VideoFrame
// ════════════════════════════════════════════════════════════════════════════

/// One captured frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoFrame {
    /// Presentation timestamp in seconds since the stream started.
    pub timestamp: f64,
    pub width:     u32,
    pub height:    u32,
    /// Packed RGBA pixels; empty for sources that carry no image.
    pub pixels:    Vec<u8>,
}

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

/// A video source.
pub trait Camera: Send + 'static {
    /// Acquire the device.  Fails on permission denial.
    fn start(&mut self) -> Result<(), VisionError>;

    /// Block until the next poll and return the current frame.
    ///
    /// Polling may be faster than the camera's frame rate, in which case the
    /// same frame (same timestamp) is returned again.  `None` ends the stream.
    fn frame(&mut self) -> Option<VideoFrame>;

    /// Release the device.
    fn stop(&mut self);
}

/// A hand landmark detector.
pub trait HandLandmarker: Send + 'static {
    /// Load the model.  Called once per session, on the inference thread.
    fn initialize(&mut self) -> Result<(), VisionError>;

    /// Detect up to two hands in `frame`.
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Result<Vec<Hand>, VisionError>;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn start(&mut self) -> Result<(), VisionError> { (**self).start() }
    fn frame(&mut self) -> Option<VideoFrame>     { (**self).frame() }
    fn stop(&mut self)                            { (**self).stop() }
}

impl<L: HandLandmarker + ?Sized> HandLandmarker for Box<L> {
    fn initialize(&mut self) -> Result<(), VisionError> { (**self).initialize() }
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Result<Vec<Hand>, VisionError> {
        (**self).detect(frame, timestamp_ms)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PacedCamera: image-less frame clock
// ════════════════════════════════════════════════════════════════════════════

/// A camera that produces empty frames on a fixed frame-rate clock.
///
/// Used with landmarkers that read their own sensor (LeapMotion) or
/// synthesise hands (simulation).  It is polled every `poll_interval`,
/// which is usually faster than the frame period, so consecutive polls
/// often return the same timestamp.
pub struct PacedCamera {
    fps:           f64,
    poll_interval: Duration,
    started:       Option<Instant>,
}

impl PacedCamera {
    pub fn new(fps: f64) -> Self {
        PacedCamera {
            fps: fps.max(1.0),
            poll_interval: Duration::from_millis(16),
            started: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Timestamp of the frame on screen `elapsed` seconds into the stream.
    fn frame_time(&self, elapsed: f64) -> f64 {
        (elapsed * self.fps).floor() / self.fps
    }
}

impl Camera for PacedCamera {
    fn start(&mut self) -> Result<(), VisionError> {
        self.started = Some(Instant::now());
        tracing::debug!(fps = self.fps, "paced camera started");
        Ok(())
    }

    fn frame(&mut self) -> Option<VideoFrame> {
        let started = self.started?;
        thread::sleep(self.poll_interval);
        Some(VideoFrame {
            timestamp: self.frame_time(started.elapsed().as_secs_f64()),
            ..VideoFrame::default()
        })
    }

    fn stop(&mut self) {
        self.started = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paced_camera_needs_start() {
        let mut cam = PacedCamera::new(30.0).with_poll_interval(Duration::ZERO);
        assert!(cam.frame().is_none());
        cam.start().unwrap();
        assert!(cam.frame().is_some());
        cam.stop();
        assert!(cam.frame().is_none());
    }

    #[test]
    fn frame_time_quantises_to_frame_period() {
        let cam = PacedCamera::new(10.0);
        assert_eq!(cam.frame_time(0.0), 0.0);
        assert_eq!(cam.frame_time(0.05), 0.0);
        assert_eq!(cam.frame_time(0.19), 0.1);
        assert_eq!(cam.frame_time(0.25), 0.2);
    }

    #[test]
    fn fast_polling_repeats_timestamps() {
        let mut cam = PacedCamera::new(1.0).with_poll_interval(Duration::ZERO);
        cam.start().unwrap();
        let a = cam.frame().unwrap().timestamp;
        let b = cam.frame().unwrap().timestamp;
        assert_eq!(a, b);
    }

    #[test]
    fn errors_render_readably() {
        let e = VisionError::Malformed { index: 8, len: 5 };
        assert_eq!(e.to_string(), "hand has 5 landmarks, needed index 8");
    }
}
