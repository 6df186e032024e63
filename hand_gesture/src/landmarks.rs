//! Hand landmark storage.
//!
//! A detected hand is an ordered list of labeled points in normalized image
//! coordinates (`x`, `y` in `[0, 1]`, `z` relative depth).  Index meanings
//! follow the usual 21-point hand model.

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_TIP:  usize = 20;

/// Points per hand in the full model.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Landmark / Hand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Distance to `other` in the image plane, ignoring depth.
    /// Computed in double precision.
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Landmark, t: f32) -> Landmark {
        Landmark {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

/// One detected hand, in detector order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Hand { landmarks }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn len(&self) -> usize { self.landmarks.len() }

    pub fn is_empty(&self) -> bool { self.landmarks.is_empty() }

    /// Build a full 21-point hand from a wrist and five fingertips.
    ///
    /// Intermediate joints are spaced evenly along the wrist→tip segment.
    /// `tips` is ordered thumb, index, middle, ring, pinky.
    pub fn from_tips(wrist: Landmark, tips: [Landmark; 5]) -> Hand {
        let mut landmarks = vec![wrist; LANDMARK_COUNT];
        for (finger, tip) in tips.iter().enumerate() {
            let base = 1 + finger * 4;
            for joint in 0..4 {
                let t = (joint + 1) as f32 / 4.0;
                landmarks[base + joint] = wrist.lerp(tip, t);
            }
        }
        Hand { landmarks }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
