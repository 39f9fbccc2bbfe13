//! Key-value persistence port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for key-value store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable string key-value storage.
///
/// Implementations must make each `put` all-or-nothing: a reader observes
/// either the previous value or the new one, never a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` when nothing is stored.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] when the adapter cannot represent
    /// the key, or [`StorageError::Backend`] on write failure.
    async fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value stored under `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Removes every listed key, continuing past keys that are missing.
    async fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Errors returned by key-value store implementations and the typed facade.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The key cannot be represented by the storage backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// The stored bytes failed their integrity check.
    #[error("stored value for {0} is corrupted")]
    Corrupted(String),

    /// A stored value could not be encoded or decoded.
    #[error("failed to encode value for {key}: {source}")]
    Encoding {
        /// Key being read or written.
        key: String,
        /// Underlying serialization error.
        source: Arc<serde_json::Error>,
    },

    /// Backend failure.
    #[error("storage backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Wraps a serialization error for the given key.
    pub fn encoding(key: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Encoding {
            key: key.into(),
            source: Arc::new(err),
        }
    }
}
