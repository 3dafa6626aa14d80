//! Preview Message Definitions
//!
//! ```text
//! host ──PreviewMsg──► SessionActor ──PreviewEvent──► host
//! ```

use std::fmt;

use tokio::sync::oneshot;

use super::state::{DocumentId, ZoomAction};
use crate::engine::{Layout, ParsedDocument, Theme, VisualOutput};

/// Handle of one preview session, unique per coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(super) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Inbound
// =============================================================================

/// Messages to a session actor
#[derive(Debug)]
pub enum PreviewMsg {
    /// Document text changed (debounced)
    Edit(String),
    /// Switch theme
    Theme(Theme),
    /// Flip between light and dark
    ToggleTheme,
    /// Select a view by name
    SelectView(String),
    /// Another document became active (immediate, uncached)
    Focus { identity: DocumentId, text: String },
    /// Adjust zoom
    Zoom(ZoomAction),
    /// Read the committed state for export
    Snapshot(oneshot::Sender<Option<SessionSnapshot>>),
    /// Stop the actor
    Close,
}

// =============================================================================
// Outbound
// =============================================================================

/// Notifications from sessions to the host surface
#[derive(Debug, Clone)]
pub enum PreviewEvent {
    /// A new visual is ready to display
    Rendered {
        session: SessionId,
        visual: VisualOutput,
        /// View names of the displayed document, in declaration order
        views: Vec<String>,
        selected: Option<String>,
        /// Revision of the text the visual was built from
        revision: u64,
        zoom: f64,
    },
    /// A pass failed; the previous visual stays on screen
    Failed {
        session: SessionId,
        message: String,
        /// The engine could not be loaded; further edits are not processed
        fatal: bool,
    },
    /// Zoom changed; no re-render is needed
    Zoomed { session: SessionId, zoom: f64 },
}

impl PreviewEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::Rendered { session, .. }
            | Self::Failed { session, .. }
            | Self::Zoomed { session, .. } => *session,
        }
    }
}

/// Committed state of a session, as needed to export it.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub identity: Option<DocumentId>,
    pub document: ParsedDocument,
    pub layout: Layout,
    pub theme: Theme,
    pub selected: Option<String>,
    pub zoom: f64,
}
