//! Landmarks from a LeapMotion controller (feature `leap`).
//!
//! The LeapC connection lives on its own polling thread.  Each tracking
//! frame is converted to 21-point hands in normalized image coordinates and
//! overwrites a single shared cell; [`LeapLandmarker::detect`] reads it.
//! Dropping the landmarker stops the polling thread.
//!
//! Requires the LeapC shared library installed on the system.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::landmarks::{Hand, Landmark};
use crate::vision::{HandLandmarker, VideoFrame, VisionError};

/// Interaction box mapped onto the unit image square, in millimetres.
const BOX_HALF_WIDTH: f32 = 250.0;
const BOX_FLOOR:      f32 = 50.0;
const BOX_HEIGHT:     f32 = 450.0;
const BOX_DEPTH:      f32 = 500.0;

/// Newest tracking frame, shared between the polling thread and `detect`.
#[derive(Default)]
struct HandFeed {
    hands:  Mutex<Vec<Hand>>,
    stop:   AtomicBool,
    exited: AtomicBool,
}

impl HandFeed {
    fn store(&self, hands: Vec<Hand>) {
        *self.hands.lock().unwrap_or_else(|p| p.into_inner()) = hands;
    }

    fn latest(&self) -> Result<Vec<Hand>, VisionError> {
        if self.exited.load(Ordering::Acquire) {
            return Err(VisionError::Detection("LeapMotion polling thread exited".to_string()));
        }
        Ok(self.hands.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn stopped(&self) -> bool { self.stop.load(Ordering::Acquire) }
}

pub struct LeapLandmarker {
    feed: Option<Arc<HandFeed>>,
}

impl LeapLandmarker {
    pub fn new() -> Self {
        LeapLandmarker { feed: None }
    }
}

impl Drop for LeapLandmarker {
    fn drop(&mut self) {
        if let Some(feed) = &self.feed {
            feed.stop.store(true, Ordering::Release);
        }
    }
}

impl Default for LeapLandmarker {
    fn default() -> Self { Self::new() }
}

/// Project a LeapC position (mm, y up) into image coordinates (y down).
fn to_image(x: f32, y: f32, z: f32) -> Landmark {
    Landmark::new(
        (x + BOX_HALF_WIDTH) / (2.0 * BOX_HALF_WIDTH),
        1.0 - (y - BOX_FLOOR) / BOX_HEIGHT,
        z / BOX_DEPTH,
    )
}

fn convert_hand(hand: &leaprs::Hand) -> Hand {
    let palm  = hand.palm().position();
    let wrist = to_image(palm.x, palm.y, palm.z);
    let mut landmarks = vec![wrist; crate::landmarks::LANDMARK_COUNT];

    for (finger, digit) in hand.digits().enumerate().take(5) {
        let base = digit.metacarpal().next_joint();
        let tip  = digit.distal().next_joint();
        let mcp  = to_image(base.x, base.y, base.z);
        let end  = to_image(tip.x, tip.y, tip.z);
        let first = 1 + finger * 4;
        landmarks[first]     = mcp;
        landmarks[first + 1] = mcp.lerp(&end, 1.0 / 3.0);
        landmarks[first + 2] = mcp.lerp(&end, 2.0 / 3.0);
        landmarks[first + 3] = end;
    }
    Hand::new(landmarks)
}

impl HandLandmarker for LeapLandmarker {
    fn initialize(&mut self) -> Result<(), VisionError> {
        use leaprs::*;

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), VisionError>>();
        let feed = Arc::new(HandFeed::default());
        let thread_feed = Arc::clone(&feed);

        thread::spawn(move || {
            let feed = thread_feed;
            let mut connection = match Connection::create(ConnectionConfig::default()) {
                Ok(c)  => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(VisionError::ModelLoad(format!("{:?}", e))));
                    return;
                }
            };
            if let Err(e) = connection.open() {
                let _ = ready_tx.send(Err(VisionError::CameraDenied(format!("{:?}", e))));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while !feed.stopped() {
                let msg = match connection.poll(100) {
                    Ok(m)  => m,
                    Err(_) => continue,
                };
                if let Event::Tracking(frame) = msg.event() {
                    feed.store(frame.hands().take(2).map(|h| convert_hand(&h)).collect());
                }
            }
            feed.exited.store(true, Ordering::Release);
            tracing::debug!("LeapMotion polling thread stopped");
        });

        ready_rx
            .recv_timeout(Duration::from_secs(5))
            .map_err(|_| {
                feed.stop.store(true, Ordering::Release);
                VisionError::ModelLoad("LeapC service did not respond".to_string())
            })??;
        self.feed = Some(feed);
        tracing::info!("LeapMotion landmarker connected");
        Ok(())
    }

    fn detect(&mut self, _frame: &VideoFrame, _timestamp_ms: f64) -> Result<Vec<Hand>, VisionError> {
        self.feed.as_ref()
            .ok_or_else(|| VisionError::Detection("LeapMotion not initialised".to_string()))?
            .latest()
    }
}
