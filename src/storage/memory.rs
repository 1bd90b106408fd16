//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::KeyValueStore;
use crate::error::{FilterError, Result};

/// Shared in-memory store.
///
/// Clones share the same entries, so a test can hand one clone to the engine
/// and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail, for exercising error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.lock() {
            return Err(FilterError::Storage("simulated write error".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("filters", "{}").unwrap();
        assert_eq!(other.get("filters").unwrap().as_deref(), Some("{}"));

        other.remove("filters").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_simulated_write_error() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(matches!(store.set("k", "v"), Err(FilterError::Storage(_))));
        assert!(store.get("k").unwrap().is_none());
    }
}
