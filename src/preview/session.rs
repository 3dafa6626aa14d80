//! Preview session state machine.
//!
//! ```text
//!             edit                  timer                 ok
//! Waiting ──────────► PendingDebounce ─────► Rendering ───────► Idle
//!    ▲                      ▲   │ edit                │  err
//!    │ (no successful       │   └──(restart)          └───────► Error
//!    │  pass yet)           └─────────── edit ◄──────────────────┘
//! ```
//!
//! Theme and view changes re-render from the cached snapshot without parsing,
//! unless the last full pass failed and left that snapshot behind the text.
//! A focus change cancels any pending debounce and runs an uncached full pass
//! immediately. A fatal engine load failure parks the session in `Error`.
//!
//! The session never reads the clock; the owning actor passes `now`.

use std::sync::Arc;

use tokio::time::Instant;

use super::debouncer::Debouncer;
use super::messages::{PreviewEvent, SessionId, SessionSnapshot};
use super::state::{DocumentId, PreviewState, Snapshot, ZoomAction};
use super::PreviewSettings;
use crate::engine::{EngineError, EngineGateway, Theme, VisualOutput};
use crate::utils::hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No successful pass yet
    Waiting,
    /// Showing the latest successful visual
    Idle,
    /// An edit is waiting for the quiet period to end
    PendingDebounce,
    /// A pipeline pass is running
    Rendering,
    /// The last pass failed; the previous visual stays on screen
    Error,
}

pub struct PreviewSession {
    id: SessionId,
    gateway: Arc<EngineGateway>,
    settings: PreviewSettings,
    state: PreviewState,
    debouncer: Debouncer,
    phase: Phase,
    /// Result of the last completed pass (`Waiting`, `Idle` or `Error`)
    outcome: Phase,
    /// The last full pass failed, so the snapshot no longer matches the text
    cache_stale: bool,
    fatal: bool,
}

impl PreviewSession {
    pub fn new(id: SessionId, gateway: Arc<EngineGateway>, settings: PreviewSettings) -> Self {
        let mut state = PreviewState::new(settings.theme, settings.zoom);
        if let Some(view) = &settings.initial_view {
            state.select_view(view);
        }
        Self {
            id,
            debouncer: Debouncer::new(settings.debounce),
            gateway,
            settings,
            state,
            phase: Phase::Waiting,
            outcome: Phase::Waiting,
            cache_stale: false,
            fatal: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    /// When the pending debounce fires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Record new text and (re)start the debounce window.
    pub fn on_edit(&mut self, text: impl Into<Arc<str>>, now: Instant) {
        let text = text.into();
        self.state.record_text(Arc::clone(&text));
        if self.fatal {
            crate::debug!("preview"; "session {} ignores edit: engine unavailable", self.id);
            return;
        }
        self.debouncer.schedule(text, now);
        self.phase = Phase::PendingDebounce;
    }

    /// Run the debounced full pass if its quiet period has elapsed.
    pub fn on_timer(&mut self, now: Instant) -> Option<PreviewEvent> {
        let text = self.debouncer.take_if_ready(now)?;
        Some(self.full_pass(&text, true))
    }

    /// Switch theme and re-render from the cached snapshot.
    pub fn on_theme(&mut self, theme: Theme) -> Option<PreviewEvent> {
        if !self.state.set_theme(theme) {
            return None;
        }
        self.render_only()
    }

    pub fn on_theme_toggle(&mut self) -> Option<PreviewEvent> {
        let theme = self.state.theme().toggled();
        self.on_theme(theme)
    }

    /// Select a view and re-render from the cached snapshot.
    /// Unknown names are ignored.
    pub fn on_view_select(&mut self, name: &str) -> Option<PreviewEvent> {
        if !self.state.select_view(name) {
            return None;
        }
        self.render_only()
    }

    /// Track another document and render it right away.
    pub fn on_focus_change(
        &mut self,
        identity: DocumentId,
        text: impl Into<Arc<str>>,
    ) -> PreviewEvent {
        let text = text.into();
        self.debouncer.cancel();
        self.state.focus(identity, Arc::clone(&text));
        self.full_pass(&text, false)
    }

    pub fn on_zoom(&mut self, action: ZoomAction) -> Option<PreviewEvent> {
        if !self.state.apply_zoom(action) {
            return None;
        }
        Some(PreviewEvent::Zoomed {
            session: self.id,
            zoom: self.state.zoom(),
        })
    }

    /// Committed document, layout and presentation state.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let snapshot = self.state.snapshot()?;
        Some(SessionSnapshot {
            identity: self.state.identity().cloned(),
            document: snapshot.document().clone(),
            layout: snapshot.layout().clone(),
            theme: self.state.theme(),
            selected: self.state.selected_view().map(str::to_string),
            zoom: self.state.zoom(),
        })
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Parse, lay out and render `text`. With `reuse`, a snapshot built from
    /// identical text skips straight to rendering.
    fn full_pass(&mut self, text: &str, reuse: bool) -> PreviewEvent {
        self.phase = Phase::Rendering;
        let revision = self.state.revision();
        let fingerprint = hash::compute(text);

        let fresh = reuse
            && self
                .state
                .snapshot()
                .is_some_and(|s| s.fingerprint() == fingerprint);

        let result = if fresh {
            crate::debug!("preview"; "session {} text unchanged, render only", self.id);
            self.state.refresh_revision(revision);
            self.render_cached()
        } else {
            self.rebuild(text, fingerprint, revision)
        };
        // A failed render of a fresh snapshot leaves the cache usable
        self.cache_stale = result.is_err() && !fresh;
        self.finish(result)
    }

    /// Full parse → layout → render. The snapshot is replaced only when every
    /// stage succeeds.
    fn rebuild(
        &mut self,
        text: &str,
        fingerprint: u64,
        revision: u64,
    ) -> Result<VisualOutput, EngineError> {
        let document = self.gateway.parse(text)?;
        let layout = self.gateway.compute_layout(&document)?;
        let options = self
            .state
            .render_options(&document, self.settings.fallback_size);
        let visual = self.gateway.render_view(&document, &layout, &options)?;

        self.state
            .commit(Snapshot::new(document, layout, fingerprint, revision));
        Ok(visual)
    }

    fn render_cached(&self) -> Result<VisualOutput, EngineError> {
        let snapshot = self
            .state
            .snapshot()
            .ok_or_else(|| EngineError::Render("nothing to render yet".into()))?;
        let options = self
            .state
            .render_options(snapshot.document(), self.settings.fallback_size);
        self.gateway
            .render_view(snapshot.document(), snapshot.layout(), &options)
    }

    /// Re-render after a presentation change. Skipped while there is no
    /// usable snapshot or the engine is gone. A failed render-only pass does
    /// not block the next one.
    fn render_only(&mut self) -> Option<PreviewEvent> {
        if self.cache_stale || self.fatal || self.state.snapshot().is_none() {
            return None;
        }
        self.phase = Phase::Rendering;
        let result = self.render_cached();
        Some(self.finish(result))
    }

    fn finish(&mut self, result: Result<VisualOutput, EngineError>) -> PreviewEvent {
        let event = match result {
            Ok(visual) => {
                self.outcome = Phase::Idle;
                PreviewEvent::Rendered {
                    session: self.id,
                    visual,
                    views: self.state.views().to_vec(),
                    selected: self.state.selected_view().map(str::to_string),
                    revision: self.state.snapshot().map_or(0, Snapshot::revision),
                    zoom: self.state.zoom(),
                }
            }
            Err(e) => {
                if e.is_fatal() {
                    self.fatal = true;
                    self.debouncer.cancel();
                }
                crate::debug!("preview"; "session {} failed: {}", self.id, e);
                self.outcome = Phase::Error;
                PreviewEvent::Failed {
                    session: self.id,
                    message: e.to_string(),
                    fatal: self.fatal,
                }
            }
        };

        // A render-only pass must not disturb an edit still waiting
        self.phase = if self.debouncer.is_pending() {
            Phase::PendingDebounce
        } else {
            self.outcome
        };
        event
    }
}
