//! Persistent key/value store for the document text and view preferences.
//!
//! Values are strings. Zoom levels are stored as decimal integers. The session treats
//! every store failure as non-fatal: it logs and keeps running on its in-memory state.

use crate::error::StoreError;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;

pub const DOCUMENT_KEY: &str = "mdpad.document";
pub const EDITOR_ZOOM_KEY: &str = "mdpad.zoom.editor";
pub const PREVIEW_ZOOM_KEY: &str = "mdpad.zoom.preview";
/// Single zoom value used for both panes in shared-zoom mode.
pub const SHARED_ZOOM_KEY: &str = "mdpad.zoom";

pub trait SettingsStore: Send + Sync {
    /// The stored value, or `None` when the key was never written.
    fn load(&self, key: &str) -> Option<String>;

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a half-written map behind
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn encoded_size(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes once keys and values exceed `bytes` in total.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        if let Some(quota) = self.quota {
            let current = encoded_size(&entries);
            let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let needed = current - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object file on disk, cached in memory.
///
/// Every save rewrites the file atomically. When the write fails the cache is rolled
/// back, so `load` keeps returning what is actually on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<BTreeMap<String, String>>,
    /// Set when the file exists but could not be read; saves are refused.
    read_error: Option<String>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A missing or malformed file
    /// starts out empty. Any other read failure leaves the store empty and
    /// read-only, so the file on disk is never overwritten blindly.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut read_error = None;
        let cache = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed store file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not read store file");
                read_error = Some(e.to_string());
                BTreeMap::new()
            }
        };

        Self {
            path,
            cache: Mutex::new(cache),
            read_error,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(entries)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        lock(&self.cache).get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(reason) = &self.read_error {
            return Err(StoreError::Unreadable {
                path: self.path.display().to_string(),
                reason: reason.clone(),
            });
        }

        let mut cache = lock(&self.cache);
        let previous = cache.insert(key.to_string(), value.to_string());

        if let Err(e) = self.persist(&cache) {
            match previous {
                Some(old) => cache.insert(key.to_string(), old),
                None => cache.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Save, logging instead of failing.
pub(crate) fn save_or_warn(store: &dyn SettingsStore, key: &str, value: &str) -> bool {
    match store.save(key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "could not persist value");
            false
        }
    }
}
