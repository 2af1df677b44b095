use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use keepsake_core::{BackendLabel, CacheEntry, Raw, ResourceAddress};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{BackendError, DeleteStatus, format::Format};

pub type BackendResult<T> = Result<T, BackendError>;

/// Persistent keyed slot storage for cache entries.
///
/// Implementations must replace an entry atomically: a concurrent reader sees
/// either the previous complete payload or the new one, never a partial
/// write. The timestamp returned by [`read`](Backend::read) is the moment of
/// the last write and must move forward with every write to the same address.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, address: &ResourceAddress) -> BackendResult<Option<CacheEntry<Raw>>>;

    async fn write(&self, address: &ResourceAddress, payload: Raw) -> BackendResult<()>;

    async fn remove(&self, address: &ResourceAddress) -> BackendResult<DeleteStatus>;

    /// Removes every entry, returning how many were removed.
    async fn clear(&self) -> BackendResult<u64>;

    /// Returns the label of this backend for logs and metrics.
    fn label(&self) -> BackendLabel {
        BackendLabel::UNNAMED
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, address: &ResourceAddress) -> BackendResult<Option<CacheEntry<Raw>>> {
        (**self).read(address).await
    }

    async fn write(&self, address: &ResourceAddress, payload: Raw) -> BackendResult<()> {
        (**self).write(address, payload).await
    }

    async fn remove(&self, address: &ResourceAddress) -> BackendResult<DeleteStatus> {
        (**self).remove(address).await
    }

    async fn clear(&self) -> BackendResult<u64> {
        (**self).clear().await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, address: &ResourceAddress) -> BackendResult<Option<CacheEntry<Raw>>> {
        (**self).read(address).await
    }

    async fn write(&self, address: &ResourceAddress, payload: Raw) -> BackendResult<()> {
        (**self).write(address, payload).await
    }

    async fn remove(&self, address: &ResourceAddress) -> BackendResult<DeleteStatus> {
        (**self).remove(address).await
    }

    async fn clear(&self) -> BackendResult<u64> {
        (**self).clear().await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

/// Cache Entry Store operations on top of any [`Backend`].
///
/// Reads here never fail: a backend error, a missing entry and an entry that
/// does not decode all come back as `None`, so a broken cache degrades to
/// "no cache" instead of aborting a fetch.
pub trait EntryStore: Backend {
    /// Reads the raw entry for `address`.
    fn get(
        &self,
        address: &ResourceAddress,
    ) -> impl Future<Output = Option<CacheEntry<Raw>>> + Send {
        async move {
            match self.read(address).await {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(%address, backend = %self.label(), %error, "Cache read failed");
                    None
                }
            }
        }
    }

    /// Reads the entry for `address` and decodes it into `T`.
    fn read_as<T, F>(
        &self,
        address: &ResourceAddress,
        format: &F,
    ) -> impl Future<Output = Option<CacheEntry<T>>> + Send
    where
        T: DeserializeOwned + Send,
        F: Format,
    {
        async move {
            let entry = self.get(address).await?;
            match format.decode::<T>(entry.payload()) {
                Ok(value) => Some(CacheEntry::new(value, entry.modified())),
                Err(error) => {
                    debug!(%address, format = format.name(), %error, "Cached entry does not decode");
                    None
                }
            }
        }
    }

    /// Whether an entry exists for `address` and is within `expiry`.
    fn is_valid(
        &self,
        address: &ResourceAddress,
        expiry: Option<Duration>,
    ) -> impl Future<Output = bool> + Send {
        async move {
            self.get(address)
                .await
                .is_some_and(|entry| entry.is_valid_now(expiry))
        }
    }

    /// Atomically replaces the entry for `address`.
    fn put(
        &self,
        address: &ResourceAddress,
        payload: Raw,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move {
            let result = self.write(address, payload).await;
            if let Err(error) = &result {
                warn!(%address, backend = %self.label(), %error, "Cache write failed");
            }
            result
        }
    }

    /// Deletes the entry for `address`.
    fn delete(
        &self,
        address: &ResourceAddress,
    ) -> impl Future<Output = BackendResult<DeleteStatus>> + Send {
        async move {
            let status = self.remove(address).await?;
            debug!(%address, backend = %self.label(), ?status, "Cache entry deleted");
            Ok(status)
        }
    }

    /// Deletes every entry.
    fn delete_all(&self) -> impl Future<Output = BackendResult<u64>> + Send {
        async move {
            let removed = self.clear().await?;
            debug!(backend = %self.label(), removed, "Cache cleared");
            Ok(removed)
        }
    }
}

impl<B: Backend + ?Sized> EntryStore for B {}
