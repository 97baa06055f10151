//! Key/value document storage.
//!
//! Documents are addressed by `<collection>:<id>` keys and stored as JSON.
//! Every operation is atomic for a single key; nothing spans documents.

mod file;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("unsupported store url: {0}")]
    UnsupportedUrl(String),
}

pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Writes only if `key` is absent. Returns whether the write happened.
    fn insert(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// Writes only if `key` is present. Returns whether the write happened.
    fn replace(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    fn get_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// JSON helpers over any [`Store`].
pub trait StoreExt: Store {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set(key, &serde_json::to_vec(value)?)
    }

    fn insert_json<T: Serialize>(&self, key: &str, value: &T) -> Result<bool, StoreError> {
        self.insert(key, &serde_json::to_vec(value)?)
    }

    fn replace_json<T: Serialize>(&self, key: &str, value: &T) -> Result<bool, StoreError> {
        self.replace(key, &serde_json::to_vec(value)?)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Opens the store named by a connection string.
pub fn open(url: &str) -> Result<Arc<dyn Store>, StoreError> {
    if url == "memory://" {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(Arc::new(FileStore::new(PathBuf::from(path))?));
    }
    if url.contains("://") || url.is_empty() {
        return Err(StoreError::UnsupportedUrl(url.to_string()));
    }
    Ok(Arc::new(FileStore::new(PathBuf::from(url))?))
}
