//! `[export]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [export]
//! raster_scale = 2.0                  # Device pixels per view pixel (PNG and PDF pages)
//! state_file = ".glimpse/state.json"  # Remembers the last export directory
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::export::DEFAULT_RASTER_SCALE;

const MAX_RASTER_SCALE: f32 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub raster_scale: f32,
    /// Relative to the project root after loading
    pub state_file: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            raster_scale: DEFAULT_RASTER_SCALE,
            state_file: PathBuf::from(".glimpse/state.json"),
        }
    }
}

impl ExportConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.raster_scale.is_finite()
            || self.raster_scale <= 0.0
            || self.raster_scale > MAX_RASTER_SCALE
        {
            diag.error(
                "export.raster_scale",
                format!("{} is outside (0, {MAX_RASTER_SCALE}]", self.raster_scale),
            );
        }
    }
}
