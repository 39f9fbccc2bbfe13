//! Typed facade over the key-value store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

use super::StorageKey;
use super::ports::{KeyValueStore, StorageError, StorageResult};

/// Marks which session a pending write belongs to.
///
/// Taken before a network call and presented when the result is persisted;
/// a ticket issued before the last [`LocalState::clear_all`] no longer
/// writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket(u64);

#[derive(Debug, Default)]
struct SessionGate {
    epoch: AtomicU64,
    writes: Mutex<()>,
}

/// Persisted client state addressed by [`StorageKey`].
///
/// Values are stored as JSON. The facade is cheap to clone; clones share the
/// underlying store and the session epoch.
pub struct LocalState<S>
where
    S: KeyValueStore,
{
    store: Arc<S>,
    gate: Arc<SessionGate>,
}

impl<S> Clone for LocalState<S>
where
    S: KeyValueStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S> LocalState<S>
where
    S: KeyValueStore,
{
    /// Creates a facade over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            gate: Arc::new(SessionGate::default()),
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Loads and decodes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encoding`] when the stored JSON does not match
    /// `T`, or any error reported by the store.
    pub async fn load<T>(&self, key: StorageKey) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::encoding(key.as_str(), err))
    }

    /// Encodes and stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encoding`] when `value` cannot be serialized,
    /// or any error reported by the store.
    pub async fn save<T>(&self, key: StorageKey, value: &T) -> StorageResult<()>
    where
        T: Serialize + ?Sized,
    {
        let raw =
            serde_json::to_string(value).map_err(|err| StorageError::encoding(key.as_str(), err))?;
        self.store.put(key.as_str(), &raw).await
    }

    /// Removes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn remove(&self, key: StorageKey) -> StorageResult<()> {
        self.store.remove(key.as_str()).await
    }

    /// Returns a ticket for the current session.
    #[must_use]
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket(self.gate.epoch.load(Ordering::Acquire))
    }

    /// Returns `true` while no [`Self::clear_all`] has run since `ticket`
    /// was taken.
    #[must_use]
    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        self.ticket() == ticket
    }

    /// Stores `value` under `key` unless the session of `ticket` has ended.
    ///
    /// Returns `false` when the write was discarded.
    ///
    /// # Errors
    ///
    /// Same as [`Self::save`].
    pub async fn save_for<T>(
        &self,
        ticket: SessionTicket,
        key: StorageKey,
        value: &T,
    ) -> StorageResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let _writes = self.gate.writes.lock().await;
        if !self.is_current(ticket) {
            tracing::debug!(key = key.as_str(), "session ended; discarding write");
            return Ok(false);
        }
        self.save(key, value).await?;
        Ok(true)
    }

    /// Removes `key` unless the session of `ticket` has ended.
    ///
    /// Returns `false` when the removal was skipped.
    ///
    /// # Errors
    ///
    /// Same as [`Self::remove`].
    pub async fn remove_for(&self, ticket: SessionTicket, key: StorageKey) -> StorageResult<bool> {
        let _writes = self.gate.writes.lock().await;
        if !self.is_current(ticket) {
            return Ok(false);
        }
        self.remove(key).await?;
        Ok(true)
    }

    /// Removes every key in the namespace: token, user, cache and queue.
    ///
    /// Ends the current session: writes presented with an earlier
    /// [`SessionTicket`] are discarded from now on, even when the keys could
    /// not all be removed.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn clear_all(&self) -> StorageResult<()> {
        let _writes = self.gate.writes.lock().await;
        self.gate.epoch.fetch_add(1, Ordering::AcqRel);
        let keys = StorageKey::ALL.map(StorageKey::as_str);
        self.store.remove_many(&keys).await?;
        tracing::info!("cleared persisted client state");
        Ok(())
    }
}
