//! `[preview]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [preview]
//! debounce_ms = 300          # Quiet period after the last edit
//! theme = "dark"             # Initial theme (light | dark)
//! zoom = 1.0                 # Initial zoom, 0.1 ..= 3.0
//! fallback_width = 800       # Canvas size for documents without views
//! fallback_height = 600
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::engine::Theme;
use crate::preview::{DEBOUNCE_MS, FALLBACK_SIZE, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN};

/// Longest accepted debounce interval.
const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub debounce_ms: u64,
    pub theme: Theme,
    pub zoom: f64,
    pub fallback_width: f64,
    pub fallback_height: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            theme: Theme::Light,
            zoom: ZOOM_DEFAULT,
            fallback_width: FALLBACK_SIZE.0,
            fallback_height: FALLBACK_SIZE.1,
        }
    }
}

impl PreviewConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            diag.error(
                "preview.debounce_ms",
                format!("{} exceeds the {MAX_DEBOUNCE_MS} ms maximum", self.debounce_ms),
            );
        }
        if !(ZOOM_MIN..=ZOOM_MAX).contains(&self.zoom) {
            diag.error(
                "preview.zoom",
                format!("{} is outside {ZOOM_MIN}..={ZOOM_MAX}", self.zoom),
            );
        }
        for (field, value) in [
            ("preview.fallback_width", self.fallback_width),
            ("preview.fallback_height", self.fallback_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                diag.error(field, format!("must be a positive size, got {value}"));
            }
        }
    }
}
