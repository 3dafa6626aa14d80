//! Export destinations.
//!
//! Default file names come from the source document's stem and the format's
//! extension, placed in the last used export directory when one is known.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::ExportFormat;
use super::store::{LAST_DIRECTORY_KEY, MemoryStateStore, StateStore};
use crate::engine::View;
use crate::utils::path::{expand_user_path, normalize_path, resolve_path};

pub struct DestinationResolver {
    store: Arc<dyn StateStore>,
    last_dir: Mutex<Option<PathBuf>>,
}

impl DestinationResolver {
    /// Resolver backed by `store`, seeded from its remembered directory.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let last_dir = store.get(LAST_DIRECTORY_KEY).map(PathBuf::from);
        Self {
            store,
            last_dir: Mutex::new(last_dir),
        }
    }

    /// Resolver that forgets everything at exit.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStateStore::new()))
    }

    pub fn last_directory(&self) -> Option<PathBuf> {
        self.last_dir.lock().clone()
    }

    /// `<source stem>.<ext>`, inside the last used directory if any.
    /// The result may be relative; see [`Self::resolve`].
    pub fn default_path(&self, source: &Path, format: ExportFormat) -> PathBuf {
        let name = default_file_name(source, format);
        match self.last_dir.lock().as_ref() {
            Some(dir) => dir.join(name),
            None => name,
        }
    }

    /// Target path of an export.
    ///
    /// - no destination: [`Self::default_path`]
    /// - an existing directory: `<dir>/<source stem>.<ext>`
    /// - anything else: the path itself
    ///
    /// `~` is expanded and relative paths are taken from the source file's
    /// directory.
    pub fn resolve(
        &self,
        source: &Path,
        format: ExportFormat,
        destination: Option<&Path>,
    ) -> PathBuf {
        let base = source.parent().unwrap_or(Path::new(""));
        match destination {
            Some(dest) => {
                let dest = resolve_path(&expand_user_path(dest), base);
                if dest.is_dir() {
                    dest.join(default_file_name(source, format))
                } else {
                    dest
                }
            }
            None => resolve_path(&expand_user_path(&self.default_path(source, format)), base),
        }
    }

    /// Record the directory of a completed export. Last write wins.
    pub fn remember(&self, path: &Path) {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let dir = normalize_path(parent);

        if let Err(e) = self
            .store
            .set(LAST_DIRECTORY_KEY, &dir.to_string_lossy())
        {
            crate::log!("export"; "cannot persist export directory: {}", e);
        }
        crate::debug!("export"; "remembered {}", dir.display());
        *self.last_dir.lock() = Some(dir);
    }
}

/// `<source stem>.<ext>`; `export.<ext>` when the source has no stem.
pub fn default_file_name(source: &Path, format: ExportFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "export".to_string());
    PathBuf::from(format!("{stem}.{}", format.extension()))
}

/// Lowercase, collapse whitespace runs to `-`, drop anything outside
/// `[a-z0-9-]`.
pub fn sanitize_suffix(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            out.push(ch);
        }
    }
    out
}

/// One path per view: `<dir>/<stem>-<suffix>.<ext>` next to `target`.
///
/// Empty suffixes become `view-<n>` (1-based); collisions get `-2`, `-3`, …
pub(crate) fn fan_out_paths(target: &Path, views: &[View], format: ExportFormat) -> Vec<PathBuf> {
    let dir = target.parent().unwrap_or(Path::new(""));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let ext = target
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| format.extension().to_string());

    let mut used = FxHashSet::default();
    views
        .iter()
        .enumerate()
        .map(|(index, view)| {
            let mut suffix = sanitize_suffix(&view.name);
            if suffix.is_empty() {
                suffix = format!("view-{}", index + 1);
            }
            let mut candidate = suffix.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{suffix}-{n}");
                n += 1;
            }
            dir.join(format!("{stem}-{candidate}.{ext}"))
        })
        .collect()
}
