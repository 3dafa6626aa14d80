//! Ctrl+C handling.
//!
//! Before a preview loop registers itself the handler exits the process.
//! Afterwards it wakes the loop so sessions are closed in order.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Global shutdown flag
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Set once a preview loop is listening on [`SHUTDOWN_NOTIFY`]
static LISTENING: AtomicBool = AtomicBool::new(false);

static SHUTDOWN_NOTIFY: LazyLock<Notify> = LazyLock::new(Notify::new);

pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if LISTENING.load(Ordering::SeqCst) {
            crate::log!("preview"; "shutting down...");
            SHUTDOWN_NOTIFY.notify_one();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

#[inline]
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Route Ctrl+C to the returned notifier instead of exiting.
pub fn listen() -> &'static Notify {
    LISTENING.store(true, Ordering::SeqCst);
    &SHUTDOWN_NOTIFY
}
