//! Opaque key-value persistence.
//!
//! The firmware persists provisioning data as serialized blobs under string
//! keys. The trait keeps the backing store abstract; the in-memory
//! implementation backs tests and the off-hardware binary.

#![allow(async_fn_in_trait)]

use latchkey_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Blob store for provisioning data.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous blob.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove the blob under `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Flush pending writes to durable storage.
    async fn commit(&self) -> Result<()>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }
}

/// Map a serialization failure into the store error domain.
pub(crate) fn serde_err(e: serde_json::Error) -> Error {
    Error::Serialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.put("k", b"value").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.len(), 1);

        store.put("k", b"other").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"other".to_vec()));

        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());

        // Deleting again is fine.
        store.delete("k").await.unwrap();
        store.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.put("shared", b"1").await.unwrap();
        assert_eq!(other.get("shared").await.unwrap(), Some(b"1".to_vec()));
    }
}
