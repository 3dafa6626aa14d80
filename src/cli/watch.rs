//! Source file watcher.
//!
//! Watches the parent directory so editors that save by write-and-rename
//! keep being observed, and forwards only events naming the source file.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Keeps the underlying watcher alive; dropping it stops notifications.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
}

impl SourceWatcher {
    /// Start watching `path`.
    ///
    /// The receiver yields one unit per burst the host has not consumed yet,
    /// since the file is re-read in full on every wake-up anyway.
    pub fn new(path: &Path) -> notify::Result<(Self, mpsc::Receiver<()>)> {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(notify::Error::generic(&format!(
                "cannot watch {}",
                path.display()
            )));
        };
        let name: OsString = name.to_os_string();
        let (tx, rx) = mpsc::channel(1);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_source_change(&event, &name) => {
                // Full buffer means a wake-up is already queued
                let _ = tx.try_send(());
            }
            Ok(_) => {}
            Err(e) => crate::log!("watch"; "notify error: {}", e),
        })?;
        watcher.watch(parent, RecursiveMode::NonRecursive)?;

        crate::debug!("watch"; "watching {}", path.display());
        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Content-changing event that names the watched file.
fn is_source_change(event: &Event, name: &OsStr) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}
