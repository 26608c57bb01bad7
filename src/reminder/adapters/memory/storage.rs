//! In-memory key-value storage adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::reminder::ports::{KeyValueStorage, StorageError, StorageResult};

/// Thread-safe in-memory key-value store with write-failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStorage {
    state: Arc<RwLock<StorageState>>,
}

#[derive(Debug, Default)]
struct StorageState {
    entries: HashMap<String, String>,
    set_failures_remaining: u32,
}

impl InMemoryKeyValueStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail with a backend error.
    pub fn fail_next_sets(&self, count: u32) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        state.set_failures_remaining = count;
    }

    /// Returns the raw stored value for `key`, bypassing the port.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStorage for InMemoryKeyValueStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let state = self
            .state
            .read()
            .map_err(|err| StorageError::backend(std::io::Error::other(err.to_string())))?;
        Ok(state.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StorageError::backend(std::io::Error::other(err.to_string())))?;
        if state.set_failures_remaining > 0 {
            state.set_failures_remaining -= 1;
            return Err(StorageError::backend(std::io::Error::other(
                "injected storage write failure",
            )));
        }
        state.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
