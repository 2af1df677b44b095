//! Backends for exercising failure paths.

use async_trait::async_trait;
use keepsake_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use keepsake_core::{CacheEntry, Raw, ResourceAddress};

/// Backend that always returns errors.
#[derive(Clone, Default)]
pub struct ErrorBackend;

fn simulated() -> BackendError {
    BackendError::Internal(Box::new(std::io::Error::other("simulated error")))
}

#[async_trait]
impl Backend for ErrorBackend {
    async fn read(&self, _address: &ResourceAddress) -> BackendResult<Option<CacheEntry<Raw>>> {
        Err(simulated())
    }

    async fn write(&self, _address: &ResourceAddress, _payload: Raw) -> BackendResult<()> {
        Err(simulated())
    }

    async fn remove(&self, _address: &ResourceAddress) -> BackendResult<DeleteStatus> {
        Err(simulated())
    }

    async fn clear(&self) -> BackendResult<u64> {
        Err(simulated())
    }
}
