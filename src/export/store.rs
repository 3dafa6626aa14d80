//! Persisted key/value state.
//!
//! The export flow remembers a single value across runs, the last used
//! output directory, under [`LAST_DIRECTORY_KEY`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

/// Stable key of the last used export directory.
pub const LAST_DIRECTORY_KEY: &str = "export.lastDirectory";

/// Host-provided string storage.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// In-memory store for tests and embedding hosts without persistence.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<FxHashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Flat JSON object on disk, e.g. `.glimpse/state.json`.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonStateStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// one is reported and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                crate::log!("state"; "ignoring corrupt {}: {}", path.display(), e);
                Map::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                crate::log!("state"; "cannot read {}: {}", path.display(), e);
                Map::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut values = self.values.lock();
        if values.get(key).and_then(Value::as_str) == Some(value) {
            crate::debug!("state"; "{} unchanged, skipping write", key);
            return Ok(());
        }
        values.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*values)?;
        fs::write(&self.path, json)?;
        crate::debug!("state"; "saved {}", self.path.display());
        Ok(())
    }
}
