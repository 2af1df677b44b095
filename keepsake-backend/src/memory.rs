//! In-memory backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use keepsake_core::{BackendLabel, CacheEntry, Raw, ResourceAddress};

use crate::{Backend, BackendResult, DeleteStatus};

/// In-process cache backend backed by a [`DashMap`].
///
/// Entries are lost when the last clone is dropped. Useful for tests and
/// for clients that only need to ride out short outages within one run.
///
/// ```
/// use keepsake_backend::MemoryBackend;
///
/// let backend = MemoryBackend::new();
/// assert!(backend.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    store: Arc<DashMap<ResourceAddress, CacheEntry<Raw>>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `payload` as if it had been written at `modified`.
    ///
    /// Lets callers seed entries of a known age, e.g. when importing a
    /// snapshot or exercising expiry.
    pub fn write_at(&self, address: &ResourceAddress, payload: Raw, modified: DateTime<Utc>) {
        self.store
            .insert(address.clone(), CacheEntry::new(payload, modified));
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(&self, address: &ResourceAddress) -> BackendResult<Option<CacheEntry<Raw>>> {
        Ok(self.store.get(address).map(|entry| entry.clone()))
    }

    async fn write(&self, address: &ResourceAddress, payload: Raw) -> BackendResult<()> {
        self.write_at(address, payload, Utc::now());
        Ok(())
    }

    async fn remove(&self, address: &ResourceAddress) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(address) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self) -> BackendResult<u64> {
        let removed = self.store.len() as u64;
        self.store.clear();
        Ok(removed)
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::MEMORY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_write_at_sets_timestamp() {
        let backend = MemoryBackend::new();
        let address = ResourceAddress::new("/aged");
        let written = Utc::now() - chrono::Duration::minutes(10);

        backend.write_at(&address, Bytes::from_static(b"1"), written);

        let entry = backend.read(&address).await.unwrap().unwrap();
        assert_eq!(entry.modified(), written);
    }

    #[tokio::test]
    async fn test_clear_counts_entries() {
        let backend = MemoryBackend::new();
        for i in 0..4 {
            backend
                .write(&ResourceAddress::new(format!("/{i}")), Bytes::new())
                .await
                .unwrap();
        }
        assert_eq!(backend.clear().await.unwrap(), 4);
        assert!(backend.is_empty());
    }
}
