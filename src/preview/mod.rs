//! Live preview.
//!
//! One actor per open document turns a stream of edits into rendered
//! visuals, debounced so a typing burst costs a single engine pass.
//!
//! ```text
//! PreviewCoordinator ──PreviewMsg──► SessionActor(PreviewSession) ─┐
//!        ▲                                                         │
//!        └──────────────── mpsc::Receiver<PreviewEvent> ◄──────────┘
//! ```
//!
//! # Module Structure
//!
//! - `state` - document, presentation state and cached snapshot
//! - `debouncer` - pure latest-text slot with a deadline
//! - `session` - phase machine driving the engine gateway
//! - `actor` - per-session select loop
//! - `coordinator` - session registry and host-facing API
//! - `messages` - inbound/outbound message types

mod actor;
mod coordinator;
mod debouncer;
mod messages;
mod session;
mod state;

#[cfg(test)]
mod tests;

use std::time::Duration;

use thiserror::Error;

use crate::config::PreviewConfig;
use crate::engine::Theme;

pub use coordinator::PreviewCoordinator;
pub use debouncer::DEBOUNCE_MS;
pub use messages::{PreviewEvent, SessionId, SessionSnapshot};
pub use session::{Phase, PreviewSession};
pub use state::{
    Document, DocumentId, PreviewState, Snapshot, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP,
    ZoomAction,
};

/// Canvas size used when a document declares no views.
pub const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreviewError {
    #[error("no preview session {0}")]
    UnknownSession(SessionId),
    #[error("preview session {0} has stopped")]
    Closed(SessionId),
}

/// Behavior shared by every session of a coordinator.
#[derive(Debug, Clone)]
pub struct PreviewSettings {
    /// Quiet period after the last edit before a full pass runs
    pub debounce: Duration,
    /// Theme of a fresh session
    pub theme: Theme,
    /// Zoom factor of a fresh session
    pub zoom: f64,
    /// Canvas size for documents without views
    pub fallback_size: (f64, f64),
    /// View to select once the document declares it
    pub initial_view: Option<String>,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            theme: Theme::default(),
            zoom: ZOOM_DEFAULT,
            fallback_size: FALLBACK_SIZE,
            initial_view: None,
        }
    }
}

impl From<&PreviewConfig> for PreviewSettings {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            theme: config.theme,
            zoom: config.zoom,
            fallback_size: (config.fallback_width, config.fallback_height),
            initial_view: None,
        }
    }
}
