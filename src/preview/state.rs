//! Per-session preview state.
//!
//! Everything a preview surface needs besides the debounce timer: the latest
//! document text, presentation parameters (theme, selected view, zoom) and
//! the cached parse/layout pair of the last successful pass.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::engine::{Layout, ParsedDocument, RenderOptions, Theme};

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const ZOOM_DEFAULT: f64 = 1.0;

/// Identity of an open document (file path or host-assigned name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Path> for DocumentId {
    fn from(value: &Path) -> Self {
        Self(value.to_string_lossy().into_owned())
    }
}

/// Immutable snapshot of document text. Every edit produces a new one.
#[derive(Debug, Clone)]
pub struct Document {
    pub identity: Option<DocumentId>,
    pub text: Arc<str>,
    pub revision: u64,
}

/// Parse result and layout of one text snapshot, always replaced together.
#[derive(Debug, Clone)]
pub struct Snapshot {
    document: ParsedDocument,
    layout: Layout,
    fingerprint: u64,
    revision: u64,
}

impl Snapshot {
    pub(crate) fn new(
        document: ParsedDocument,
        layout: Layout,
        fingerprint: u64,
        revision: u64,
    ) -> Self {
        debug_assert!(layout.belongs_to(&document));
        Self {
            document,
            layout,
            fingerprint,
            revision,
        }
    }

    pub fn document(&self) -> &ParsedDocument {
        &self.document
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Hash of the source text this snapshot was built from.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Zoom change requested by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomAction {
    In,
    Out,
    Reset,
    Set(f64),
}

#[derive(Debug)]
pub struct PreviewState {
    document: Option<Document>,
    theme: Theme,
    selected_view: Option<String>,
    views: Vec<String>,
    snapshot: Option<Snapshot>,
    zoom: f64,
    revision: u64,
}

impl PreviewState {
    pub fn new(theme: Theme, zoom: f64) -> Self {
        Self {
            document: None,
            theme,
            selected_view: None,
            views: Vec::new(),
            snapshot: None,
            zoom: clamp_zoom(zoom).unwrap_or(ZOOM_DEFAULT),
            revision: 0,
        }
    }

    // =========================================================================
    // Document
    // =========================================================================

    /// Record edited text for the tracked document. Returns the new revision.
    pub fn record_text(&mut self, text: Arc<str>) -> u64 {
        self.revision += 1;
        let identity = self.document.as_ref().and_then(|d| d.identity.clone());
        self.document = Some(Document {
            identity,
            text,
            revision: self.revision,
        });
        self.revision
    }

    /// Switch to another document. Cached results of a different document are
    /// dropped so they can never be shown for the new one.
    pub fn focus(&mut self, identity: DocumentId, text: Arc<str>) -> u64 {
        let same = self
            .document
            .as_ref()
            .and_then(|d| d.identity.as_ref())
            .is_some_and(|current| *current == identity);
        if !same {
            self.snapshot = None;
            self.views.clear();
        }

        self.revision += 1;
        self.document = Some(Document {
            identity: Some(identity),
            text,
            revision: self.revision,
        });
        self.revision
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn identity(&self) -> Option<&DocumentId> {
        self.document.as_ref().and_then(|d| d.identity.as_ref())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Install a new parse/layout pair and reconcile the view selection.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.selected_view = self.resolve_selection(snapshot.document());
        self.views = snapshot.document().view_names();
        self.snapshot = Some(snapshot);
    }

    /// Mark the cached snapshot as current for `revision` (text unchanged).
    pub(crate) fn refresh_revision(&mut self, revision: u64) {
        if let Some(snapshot) = &mut self.snapshot {
            snapshot.revision = revision;
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn views(&self) -> &[String] {
        &self.views
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Returns whether the theme changed.
    pub fn set_theme(&mut self, theme: Theme) -> bool {
        let changed = self.theme != theme;
        self.theme = theme;
        changed
    }

    pub fn selected_view(&self) -> Option<&str> {
        self.selected_view.as_deref()
    }

    /// Select a view by name. Returns whether the visible view changed.
    ///
    /// Before the first successful pass the name is kept as a preference and
    /// honored if the document declares it.
    pub fn select_view(&mut self, name: &str) -> bool {
        let Some(snapshot) = &self.snapshot else {
            self.selected_view = Some(name.to_string());
            return false;
        };
        if snapshot.document().view(name).is_none() {
            crate::debug!("preview"; "ignoring unknown view `{}`", name);
            return false;
        }
        if self.selected_view.as_deref() == Some(name) {
            return false;
        }
        self.selected_view = Some(name.to_string());
        true
    }

    /// Selection against `document`: keep the current one if it still exists,
    /// otherwise fall back to the first declared view.
    pub(crate) fn resolve_selection(&self, document: &ParsedDocument) -> Option<String> {
        match &self.selected_view {
            Some(name) if document.view(name).is_some() => Some(name.clone()),
            _ => document.first_view().map(|v| v.name.clone()),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Apply a zoom action. Returns whether the zoom factor changed.
    pub fn apply_zoom(&mut self, action: ZoomAction) -> bool {
        let target = match action {
            ZoomAction::In => self.zoom + ZOOM_STEP,
            ZoomAction::Out => self.zoom - ZOOM_STEP,
            ZoomAction::Reset => ZOOM_DEFAULT,
            ZoomAction::Set(value) => value,
        };
        let Some(zoom) = clamp_zoom(target) else {
            return false;
        };
        // Round away float drift from repeated steps
        let zoom = (zoom * 100.0).round() / 100.0;
        let changed = (zoom - self.zoom).abs() > f64::EPSILON;
        self.zoom = zoom;
        changed
    }

    /// Render parameters for `document` under the current presentation state.
    pub(crate) fn render_options(
        &self,
        document: &ParsedDocument,
        fallback: (f64, f64),
    ) -> RenderOptions {
        let selected = self.resolve_selection(document);
        match selected.as_deref().and_then(|name| document.view(name)) {
            Some(view) => RenderOptions::for_view(view, self.theme),
            None => RenderOptions {
                view: None,
                theme: self.theme,
                width: fallback.0,
                height: fallback.1,
            },
        }
    }
}

/// Clamp to the supported range; non-positive or non-finite input is rejected.
fn clamp_zoom(value: f64) -> Option<f64> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(value.clamp(ZOOM_MIN, ZOOM_MAX))
}
