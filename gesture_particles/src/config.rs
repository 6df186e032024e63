//! Application configuration, loaded from TOML.
//!
//! Every key is optional; missing keys take their defaults:
//!
//! ```toml
//! shape          = "SATURN"     # HEART | FLOWER | SATURN | FIREWORKS
//! particle_count = 8000
//! color          = "#60a5fa"
//! camera_enabled = true
//! window_width   = 1024
//! window_height  = 640
//! camera_fps     = 30.0
//! ```

use std::fs;
use std::path::Path;

use particle_shapes::Shape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::{parse_hex_color, DEFAULT_COLOR};

// ════════════════════════════════════════════════════════════════════════════
// ConfigError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub shape:          Shape,
    pub particle_count: usize,
    /// `#rgb` or `#rrggbb`.
    pub color:          String,
    /// Start with camera input on.
    pub camera_enabled: bool,
    pub window_width:   usize,
    pub window_height:  usize,
    /// Frame rate of the camera feed handed to the landmarker.
    pub camera_fps:     f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            shape:          Shape::Heart,
            particle_count: particle_shapes::DEFAULT_PARTICLE_COUNT,
            color:          DEFAULT_COLOR.to_string(),
            camera_enabled: true,
            window_width:   1024,
            window_height:  640,
            camera_fps:     30.0,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = Self::from_toml_str(&fs::read_to_string(path)?)?;
        tracing::info!(path = %path.display(), shape = %cfg.shape, "loaded config");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::Invalid("particle_count must be at least 1".into()));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero", self.window_width, self.window_height
            )));
        }
        if !(self.camera_fps.is_finite() && self.camera_fps > 0.0) {
            return Err(ConfigError::Invalid(format!("camera_fps {} must be positive", self.camera_fps)));
        }
        if self.shape == Shape::Scatter {
            tracing::warn!("shape is not one of HEART, FLOWER, SATURN, FIREWORKS; using scatter cube");
        }
        parse_hex_color(&self.color).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
