//! In-memory key-value store for tests and ephemeral clients.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::storage::ports::{KeyValueStore, StorageError, StorageResult};

/// Thread-safe in-memory key-value store.
///
/// Clones share the same underlying map, so a test can keep a handle and
/// inspect what a service persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when lock acquisition fails.
    pub fn len(&self) -> StorageResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|err| StorageError::backend(std::io::Error::other(err.to_string())))?;
        Ok(entries.len())
    }

    /// Returns `true` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when lock acquisition fails.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| StorageError::backend(std::io::Error::other(err.to_string())))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|err| StorageError::backend(std::io::Error::other(err.to_string())))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| StorageError::backend(std::io::Error::other(err.to_string())))?;
        entries.remove(key);
        Ok(())
    }
}
