//! # Injected Key-Value Store
//!
//! The wave forecast cache persists its single slot through this `get`/`set`
//! interface rather than a module-level global, so the backing store is a
//! construction-time choice: a JSON file under a scratch directory in
//! production, an in-memory map in tests.
//!
//! Write failures are deliberately swallowed by callers; a cache that cannot
//! persist simply behaves as if it were always cold.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Minimal persistence interface for cache slots.
///
/// Implementations must make `set` a whole-value replace: readers observe
/// either the previous value or the new one, never a partial write.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Replace the value stored under `key` wholesale.
    fn set(&self, key: &str, value: &str);
}

/// File-backed store keeping one `<key>.json` file per key.
///
/// Using /tmp by default means the cache is cleared on reboot and never
/// accumulates on disk.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        // Write to a sibling temp file and rename so readers never see a
        // partially written slot.
        let path = self.path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        let result = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            warn!("cache write failed for {key}: {e}");
        }
    }
}

/// In-memory store; used by tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.get("waves"), None);
        store.set("waves", "{\"a\":1}");
        assert_eq!(store.get("waves").as_deref(), Some("{\"a\":1}"));

        // Last writer wins, no merge
        store.set("waves", "{\"a\":2}");
        assert_eq!(store.get("waves").as_deref(), Some("{\"a\":2}"));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v1");
        store.set("k", "v2");
        assert_eq!(store.get("k").as_deref(), Some("v2"));
    }
}
