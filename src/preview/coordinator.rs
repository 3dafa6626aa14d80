//! Preview Coordinator
//!
//! Opens and closes sessions and routes host events to their actors. All
//! sessions share one engine gateway and one outbound event channel.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::actor::SessionActor;
use super::messages::{PreviewEvent, PreviewMsg, SessionId, SessionSnapshot};
use super::session::PreviewSession;
use super::state::{DocumentId, ZoomAction};
use super::{PreviewError, PreviewSettings};
use crate::engine::{EngineGateway, Theme};

/// Per-channel capacity for session inboxes and the event stream.
const CHANNEL_BUFFER: usize = 32;

struct SessionHandle {
    tx: mpsc::Sender<PreviewMsg>,
    task: JoinHandle<()>,
}

pub struct PreviewCoordinator {
    gateway: Arc<EngineGateway>,
    settings: PreviewSettings,
    sessions: FxHashMap<SessionId, SessionHandle>,
    events: mpsc::Sender<PreviewEvent>,
    next_id: u64,
}

impl PreviewCoordinator {
    /// Create a coordinator and the receiver its sessions report to.
    pub fn new(
        gateway: Arc<EngineGateway>,
        settings: PreviewSettings,
    ) -> (Self, mpsc::Receiver<PreviewEvent>) {
        let (events, events_rx) = mpsc::channel(CHANNEL_BUFFER);
        let coordinator = Self {
            gateway,
            settings,
            sessions: FxHashMap::default(),
            events,
            next_id: 1,
        };
        (coordinator, events_rx)
    }

    /// Start a session in the `Waiting` phase.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let session = PreviewSession::new(id, Arc::clone(&self.gateway), self.settings.clone());
        let actor = SessionActor::new(session, rx, self.events.clone());
        let task = tokio::spawn(actor.run());

        self.sessions.insert(id, SessionHandle { tx, task });
        crate::debug!("preview"; "opened session {}", id);
        id
    }

    /// Stop a session and wait for its actor to finish.
    pub async fn close(&mut self, id: SessionId) -> Result<(), PreviewError> {
        let handle = self
            .sessions
            .remove(&id)
            .ok_or(PreviewError::UnknownSession(id))?;
        // A send failure means the actor already stopped
        let _ = handle.tx.send(PreviewMsg::Close).await;
        let _ = handle.task.await;
        Ok(())
    }

    pub fn is_open(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // =========================================================================
    // Host events
    // =========================================================================

    pub async fn on_edit(&self, id: SessionId, text: impl Into<String>) -> Result<(), PreviewError> {
        self.send(id, PreviewMsg::Edit(text.into())).await
    }

    pub async fn on_theme_toggle(&self, id: SessionId, theme: Theme) -> Result<(), PreviewError> {
        self.send(id, PreviewMsg::Theme(theme)).await
    }

    /// Flip the session's current theme.
    pub async fn toggle_theme(&self, id: SessionId) -> Result<(), PreviewError> {
        self.send(id, PreviewMsg::ToggleTheme).await
    }

    pub async fn on_view_select(
        &self,
        id: SessionId,
        view: impl Into<String>,
    ) -> Result<(), PreviewError> {
        self.send(id, PreviewMsg::SelectView(view.into())).await
    }

    pub async fn on_focus_change(
        &self,
        id: SessionId,
        identity: impl Into<DocumentId>,
        text: impl Into<String>,
    ) -> Result<(), PreviewError> {
        let msg = PreviewMsg::Focus {
            identity: identity.into(),
            text: text.into(),
        };
        self.send(id, msg).await
    }

    pub async fn on_zoom(&self, id: SessionId, action: ZoomAction) -> Result<(), PreviewError> {
        self.send(id, PreviewMsg::Zoom(action)).await
    }

    /// Committed document of a session, or `None` before its first
    /// successful pass.
    pub async fn snapshot(&self, id: SessionId) -> Result<Option<SessionSnapshot>, PreviewError> {
        let (reply, rx) = oneshot::channel();
        self.send(id, PreviewMsg::Snapshot(reply)).await?;
        rx.await.map_err(|_| PreviewError::Closed(id))
    }

    async fn send(&self, id: SessionId, msg: PreviewMsg) -> Result<(), PreviewError> {
        let handle = self
            .sessions
            .get(&id)
            .ok_or(PreviewError::UnknownSession(id))?;
        handle
            .tx
            .send(msg)
            .await
            .map_err(|_| PreviewError::Closed(id))
    }
}
