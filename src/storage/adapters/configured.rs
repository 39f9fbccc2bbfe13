//! Store selection at startup.

use async_trait::async_trait;
use camino::Utf8Path;

use super::{DirectoryKeyValueStore, InMemoryKeyValueStore};
use crate::storage::ports::{KeyValueStore, StorageResult};

/// Durable store when a directory is configured, ephemeral otherwise.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    /// Values are lost when the process exits.
    Memory(InMemoryKeyValueStore),
    /// Values persist under a directory.
    Directory(DirectoryKeyValueStore),
}

impl ConfiguredStore {
    /// Opens a directory store at `dir`, or an in-memory store when `None`.
    ///
    /// # Errors
    ///
    /// Returns any error reported by [`DirectoryKeyValueStore::open`].
    pub fn open(dir: Option<&Utf8Path>) -> StorageResult<Self> {
        match dir {
            Some(path) => {
                tracing::debug!(%path, "opening directory store");
                DirectoryKeyValueStore::open(path).map(Self::Directory)
            }
            None => Ok(Self::Memory(InMemoryKeyValueStore::new())),
        }
    }

    /// Returns `true` when values survive a restart.
    #[must_use]
    pub const fn is_durable(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

#[async_trait]
impl KeyValueStore for ConfiguredStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::Directory(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Memory(store) => store.put(key, value).await,
            Self::Directory(store) => store.put(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        match self {
            Self::Memory(store) => store.remove(key).await,
            Self::Directory(store) => store.remove(key).await,
        }
    }
}
