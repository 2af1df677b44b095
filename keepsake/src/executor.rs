//! A single fetch attempt.

use std::time::{Duration, Instant};

use keepsake_backend::EntryStore;
use keepsake_backend::format::Format;
use keepsake_core::{ResourceAddress, Transport};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::FetchError;
use crate::metrics;

/// Result of one fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome<T, E> {
    /// Fresh data, already persisted when the store accepted it.
    Success(T),
    /// No fresh data; the cache was not touched.
    Failure(FetchError<E>),
}

impl<T, E> FetchOutcome<T, E> {
    /// Whether the attempt produced fresh data.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// Converts into a plain `Result`.
    pub fn into_result(self) -> Result<T, FetchError<E>> {
        match self {
            FetchOutcome::Success(value) => Ok(value),
            FetchOutcome::Failure(error) => Err(error),
        }
    }
}

/// Calls the transport and persists the body it returns.
///
/// The body is decoded before it is written, so every stored entry decodes
/// on its own later. A body that does not decode becomes
/// [`FetchError::Decode`] and leaves the previous entry in place.
pub struct FetchExecutor<'a, S: ?Sized, T, F> {
    store: &'a S,
    transport: &'a T,
    format: &'a F,
    timeout: Option<Duration>,
}

impl<'a, S, T, F> FetchExecutor<'a, S, T, F>
where
    S: EntryStore + ?Sized,
    T: Transport,
    F: Format,
{
    /// Creates an executor over borrowed collaborators.
    pub fn new(store: &'a S, transport: &'a T, format: &'a F, timeout: Option<Duration>) -> Self {
        Self {
            store,
            transport,
            format,
            timeout,
        }
    }

    /// Performs one attempt for `address`.
    pub async fn attempt<V>(&self, address: &ResourceAddress) -> FetchOutcome<V, T::Error>
    where
        V: DeserializeOwned,
    {
        let start = Instant::now();
        let call = self.transport.get(address);
        let response = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(response) => response.map_err(FetchError::Transport),
                Err(_) => Err(FetchError::Timeout(timeout)),
            },
            None => call.await.map_err(FetchError::Transport),
        };
        metrics::record_transport(start.elapsed(), response.is_ok());

        let raw = match response {
            Ok(raw) => raw,
            Err(error) => {
                debug!(%address, kind = error.kind(), %error, "Fetch attempt failed");
                return FetchOutcome::Failure(error);
            }
        };

        let value = match self.format.decode::<V>(&raw) {
            Ok(value) => value,
            Err(error) => {
                warn!(%address, format = self.format.name(), %error, "Fresh response does not decode");
                return FetchOutcome::Failure(FetchError::Decode(error));
            }
        };

        // A failed write is logged by the store; the fresh value still wins.
        let _ = self.store.put(address, raw).await;
        debug!(%address, "Fetched and stored fresh data");
        FetchOutcome::Success(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use keepsake_backend::MemoryBackend;
    use keepsake_backend::format::JsonFormat;
    use keepsake_core::Raw;
    use std::io;

    struct Reply(Result<&'static str, io::ErrorKind>);

    #[async_trait]
    impl Transport for Reply {
        type Error = io::Error;

        async fn get(&self, _address: &ResourceAddress) -> Result<Raw, Self::Error> {
            match self.0 {
                Ok(body) => Ok(Bytes::from_static(body.as_bytes())),
                Err(kind) => Err(io::Error::new(kind, "unreachable host")),
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        type Error = io::Error;

        async fn get(&self, _address: &ResourceAddress) -> Result<Raw, Self::Error> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_success_is_persisted_verbatim() {
        let store = MemoryBackend::new();
        let transport = Reply(Ok("[1, 2, 3]"));
        let address = ResourceAddress::new("/numbers");

        let outcome = FetchExecutor::new(&store, &transport, &JsonFormat, None)
            .attempt::<Vec<u32>>(&address)
            .await;

        assert_eq!(outcome.into_result().unwrap(), vec![1, 2, 3]);
        let entry = store.get(&address).await.unwrap();
        assert_eq!(entry.payload().as_ref(), b"[1, 2, 3]");
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let store = MemoryBackend::new();
        let address = ResourceAddress::new("/numbers");
        store.put(&address, Bytes::from_static(b"[9]")).await.unwrap();
        let transport = Reply(Err(io::ErrorKind::ConnectionRefused));

        let outcome = FetchExecutor::new(&store, &transport, &JsonFormat, None)
            .attempt::<Vec<u32>>(&address)
            .await;

        let error = outcome.into_result().unwrap_err().into_transport().unwrap();
        assert_eq!(error.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(store.get(&address).await.unwrap().payload().as_ref(), b"[9]");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_persisted() {
        let store = MemoryBackend::new();
        let address = ResourceAddress::new("/numbers");
        store.put(&address, Bytes::from_static(b"[9]")).await.unwrap();
        let transport = Reply(Ok("<html>maintenance</html>"));

        let outcome = FetchExecutor::new(&store, &transport, &JsonFormat, None)
            .attempt::<Vec<u32>>(&address)
            .await;

        assert!(matches!(outcome, FetchOutcome::Failure(FetchError::Decode(_))));
        assert_eq!(store.get(&address).await.unwrap().payload().as_ref(), b"[9]");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure() {
        let store = MemoryBackend::new();
        let address = ResourceAddress::new("/slow");

        let outcome = FetchExecutor::new(&store, &Stalled, &JsonFormat, Some(Duration::from_secs(5)))
            .attempt::<Vec<u32>>(&address)
            .await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failure(FetchError::Timeout(d)) if d == Duration::from_secs(5)
        ));
        assert!(store.is_empty());
    }
}
