//! Directory-backed key-value store.
//!
//! Each key maps to one file inside a capability-scoped directory. Writes go
//! to a temporary sibling first and are renamed into place, so a crash
//! mid-write leaves the previous value intact. Every file starts with a
//! SHA-256 digest line of its payload; a mismatch on read surfaces as
//! [`StorageError::Corrupted`].

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use sha2::{Digest, Sha256};
use std::io;
use std::sync::Arc;

use crate::storage::ports::{KeyValueStore, StorageError, StorageResult};

const VALUE_EXTENSION: &str = "json";
const PENDING_EXTENSION: &str = "pending";

/// Key-value store persisting each value as a file in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryKeyValueStore {
    dir: Arc<Dir>,
    root: Utf8PathBuf,
}

impl DirectoryKeyValueStore {
    /// Opens (creating if needed) the storage directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the directory cannot be created
    /// or opened.
    pub fn open(path: &Utf8Path) -> StorageResult<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(StorageError::backend)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(StorageError::backend)?;
        Ok(Self {
            dir: Arc::new(dir),
            root: path.to_owned(),
        })
    }

    /// Returns the directory path this store was opened at.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn run_blocking<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> StorageResult<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(StorageError::backend)?
    }
}

/// Maps a storage key to its file name, rejecting anything that could
/// escape the directory.
fn file_name_for(key: &str, extension: &str) -> StorageResult<String> {
    let is_valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
        && !key.starts_with('.')
        && !key.contains("..");
    if !is_valid {
        return Err(StorageError::InvalidKey(key.to_owned()));
    }
    Ok(format!("{key}.{extension}"))
}

fn digest_hex(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

fn encode_record(payload: &str) -> String {
    format!("{}\n{payload}", digest_hex(payload))
}

fn decode_record(key: &str, record: &str) -> StorageResult<String> {
    let Some((digest, payload)) = record.split_once('\n') else {
        return Err(StorageError::Corrupted(key.to_owned()));
    };
    if digest != digest_hex(payload) {
        return Err(StorageError::Corrupted(key.to_owned()));
    }
    Ok(payload.to_owned())
}

#[async_trait]
impl KeyValueStore for DirectoryKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let file_name = file_name_for(key, VALUE_EXTENSION)?;
        let owned_key = key.to_owned();
        self.run_blocking(move |dir| match dir.read_to_string(&file_name) {
            Ok(record) => decode_record(&owned_key, &record).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::backend(err)),
        })
        .await
    }

    async fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let file_name = file_name_for(key, VALUE_EXTENSION)?;
        let pending_name = file_name_for(key, PENDING_EXTENSION)?;
        let record = encode_record(value);
        self.run_blocking(move |dir| {
            dir.write(&pending_name, record.as_bytes())
                .map_err(StorageError::backend)?;
            dir.rename(&pending_name, dir, &file_name)
                .map_err(StorageError::backend)
        })
        .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let file_name = file_name_for(key, VALUE_EXTENSION)?;
        self.run_blocking(move |dir| match dir.remove_file(&file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::backend(err)),
        })
        .await
    }
}
