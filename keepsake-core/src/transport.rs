use async_trait::async_trait;

use crate::{Raw, ResourceAddress};

/// Performs the network call for a resource.
///
/// Only the idempotent read path is used: one call per fetch attempt,
/// returning the raw response body. The body is decoded for the caller and
/// persisted verbatim as the cache entry.
///
/// Errors are handed back to callers unchanged, so implementations should
/// return the most specific error type they have.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use keepsake_core::{Raw, ResourceAddress, Transport};
///
/// struct Static(&'static str);
///
/// #[async_trait]
/// impl Transport for Static {
///     type Error = std::io::Error;
///
///     async fn get(&self, _address: &ResourceAddress) -> Result<Raw, Self::Error> {
///         Ok(Raw::from_static(self.0.as_bytes()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Error produced by a failed call.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the resource at `address`.
    async fn get(&self, address: &ResourceAddress) -> Result<Raw, Self::Error>;
}

#[async_trait]
impl<T> Transport for std::sync::Arc<T>
where
    T: Transport + ?Sized,
{
    type Error = T::Error;

    async fn get(&self, address: &ResourceAddress) -> Result<Raw, Self::Error> {
        (**self).get(address).await
    }
}
