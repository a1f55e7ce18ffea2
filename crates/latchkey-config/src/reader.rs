//! Persisted reader provisioning data.
//!
//! Holds the identifiers the reader advertises and the issuers enrolled
//! with it. The session task only ever reads `group_id` (it feeds the
//! broadcast frame); the rest belongs to the credential engine.

use crate::store::{KeyValueStore, serde_err};
use latchkey_core::Result;
use serde::{Deserialize, Serialize};

/// Store key under which [`ReaderData`] persists.
pub const READER_DATA_KEY: &str = "reader-data";

/// An endpoint enrolled under an issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Endpoint {
    pub endpoint_id: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// A credential issuer enrolled with this reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Issuer {
    pub issuer_id: Vec<u8>,
    pub public_key: Vec<u8>,
    pub endpoints: Vec<Endpoint>,
}

/// Reader identity and enrollment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReaderData {
    /// Group identifier advertised in the broadcast frame.
    pub group_id: Vec<u8>,
    /// Unique identifier of this reader.
    pub unique_id: Vec<u8>,
    /// Enrolled issuers.
    pub issuers: Vec<Issuer>,
}

impl ReaderData {
    /// Load reader data from the store, or defaults when nothing is
    /// persisted yet.
    pub async fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        match store.get(READER_DATA_KEY).await? {
            Some(blob) => serde_json::from_slice(&blob).map_err(serde_err),
            None => Ok(Self::default()),
        }
    }

    /// Persist and commit this reader data.
    pub async fn save<S: KeyValueStore>(&self, store: &S) -> Result<()> {
        let blob = serde_json::to_vec(self).map_err(serde_err)?;
        store.put(READER_DATA_KEY, &blob).await?;
        store.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_load_empty_store_yields_defaults() {
        let store = MemoryStore::new();
        let data = ReaderData::load(&store).await.unwrap();
        assert!(data.group_id.is_empty());
        assert!(data.issuers.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = MemoryStore::new();
        let data = ReaderData {
            group_id: vec![0x01; 8],
            unique_id: vec![0x02; 8],
            issuers: vec![Issuer {
                issuer_id: vec![0xAA; 8],
                public_key: vec![0x03; 32],
                endpoints: vec![Endpoint {
                    endpoint_id: vec![0xBB; 6],
                    public_key: vec![0x04; 32],
                }],
            }],
        };
        data.save(&store).await.unwrap();

        let loaded = ReaderData::load(&store).await.unwrap();
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_serialization_error() {
        let store = MemoryStore::new();
        store.put(READER_DATA_KEY, b"not json").await.unwrap();
        assert!(ReaderData::load(&store).await.is_err());
    }
}
