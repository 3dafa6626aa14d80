//! Session Actor
//!
//! Owns one `PreviewSession` and serializes every event for it:
//!
//! ```text
//! PreviewMsg ──► select! { message | debounce deadline } ──► PreviewEvent
//! ```
//!
//! Messages are polled first (`biased`), so an edit that races the deadline
//! restarts the window instead of letting stale text through. Passes that
//! reach the engine run on the blocking pool; messages arriving meanwhile
//! wait in the channel and are handled once the pass completes.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use super::messages::{PreviewEvent, PreviewMsg};
use super::session::PreviewSession;

pub(super) struct SessionActor {
    session: Arc<Mutex<PreviewSession>>,
    rx: mpsc::Receiver<PreviewMsg>,
    events: mpsc::Sender<PreviewEvent>,
}

impl SessionActor {
    pub(super) fn new(
        session: PreviewSession,
        rx: mpsc::Receiver<PreviewMsg>,
        events: mpsc::Sender<PreviewEvent>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            rx,
            events,
        }
    }

    pub(super) async fn run(mut self) {
        let id = self.session.lock().id();
        crate::debug!("preview"; "session {} started", id);

        loop {
            let deadline = self.session.lock().deadline();
            let event = tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(PreviewMsg::Close) | None => break,
                    Some(msg) => self.handle(msg).await,
                },
                _ = wait_until(deadline) => {
                    let now = Instant::now();
                    self.offload(move |session| session.on_timer(now)).await
                }
            };

            if let Some(event) = event
                && self.events.send(event).await.is_err()
            {
                // Host dropped the event receiver
                break;
            }
        }

        crate::debug!("preview"; "session {} closed", id);
    }

    async fn handle(&self, msg: PreviewMsg) -> Option<PreviewEvent> {
        match msg {
            PreviewMsg::Edit(text) => {
                self.session.lock().on_edit(text, Instant::now());
                None
            }
            PreviewMsg::Theme(theme) => self.offload(move |s| s.on_theme(theme)).await,
            PreviewMsg::ToggleTheme => self.offload(|s| s.on_theme_toggle()).await,
            PreviewMsg::SelectView(name) => self.offload(move |s| s.on_view_select(&name)).await,
            PreviewMsg::Focus { identity, text } => {
                self.offload(move |s| Some(s.on_focus_change(identity, text)))
                    .await
            }
            PreviewMsg::Zoom(action) => self.session.lock().on_zoom(action),
            PreviewMsg::Snapshot(reply) => {
                let _ = reply.send(self.session.lock().snapshot());
                None
            }
            PreviewMsg::Close => None,
        }
    }

    /// Run a session operation that may call the engine on the blocking pool.
    async fn offload<F>(&self, work: F) -> Option<PreviewEvent>
    where
        F: FnOnce(&mut PreviewSession) -> Option<PreviewEvent> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        match tokio::task::spawn_blocking(move || work(&mut *session.lock())).await {
            Ok(event) => event,
            Err(e) => {
                crate::log!("preview"; "spawn_blocking error: {}", e);
                None
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
