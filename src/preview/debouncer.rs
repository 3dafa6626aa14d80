use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

pub const DEBOUNCE_MS: u64 = 300;

/// Pure debouncer: a single latest-text slot and its deadline.
/// No engine access, no clock reads; callers pass `now`.
#[derive(Debug)]
pub(super) struct Debouncer {
    delay: Duration,
    pending: Option<Arc<str>>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            deadline: None,
        }
    }

    /// Replace the pending text and restart the quiet period.
    pub(super) fn schedule(&mut self, text: Arc<str>, now: Instant) {
        self.pending = Some(text);
        self.deadline = Some(now + self.delay);
    }

    pub(super) fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    pub(super) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(super) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the pending text once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self, now: Instant) -> Option<Arc<str>> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.pending.take()
    }
}
