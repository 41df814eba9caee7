//! Editor tuning knobs, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiescence window for text edits before a render.
    pub text_debounce_ms: u64,
    /// Side of a handle's hit zone, in canvas pixels.
    pub handle_size: f32,
    /// Shift+rotate snaps to multiples of this.
    pub rotation_snap_degrees: f32,
    /// Interactive resizes never shrink a side below this.
    pub min_layer_size: f32,
    pub nudge_step: f32,
    /// Nudge distance with Shift held.
    pub nudge_step_large: f32,
    pub raster_cache_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            text_debounce_ms: 500,
            handle_size: lc_render::DEFAULT_HANDLE_SIZE,
            rotation_snap_degrees: 15.0,
            min_layer_size: 20.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            raster_cache_capacity: lc_render::cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.text_debounce_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.handle_size.is_finite() && self.handle_size > 0.0) {
            return Err(ConfigError::Invalid("handle_size must be positive"));
        }
        if !(self.min_layer_size.is_finite() && self.min_layer_size >= 1.0) {
            return Err(ConfigError::Invalid("min_layer_size must be at least 1"));
        }
        if !(self.rotation_snap_degrees.is_finite() && self.rotation_snap_degrees >= 0.0) {
            return Err(ConfigError::Invalid("rotation_snap_degrees must not be negative"));
        }
        if self.raster_cache_capacity == 0 {
            return Err(ConfigError::Invalid("raster_cache_capacity must be positive"));
        }
        Ok(())
    }
}
