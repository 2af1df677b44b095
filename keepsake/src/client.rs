//! The fetch orchestrator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use keepsake_backend::format::{Format, JsonFormat};
use keepsake_backend::{Backend, BackendResult, DeleteStatus, EntryStore};
use keepsake_core::{CacheEntry, CachePolicy, DegradeNotice, Raw, ResourceAddress, Transport};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::engine::{self, Decision, Precheck};
use crate::executor::{FetchExecutor, FetchOutcome};
use crate::lock::LockRegistry;
use crate::metrics::{self, Outcome};
use crate::notify::{Notifier, Observer};
use crate::FetchError;

struct ClientInner<B, T, F> {
    backend: B,
    transport: T,
    format: F,
    config: ClientConfig,
    locks: LockRegistry,
    notifier: Notifier,
}

/// Fetches resources through a transport and keeps the last good response.
///
/// Every call for one address runs under that address's lock, so a second
/// caller sees whatever the first one stored. Cheap to clone; clones share
/// the backend, the locks and the notice channel.
///
/// Call it from within a tokio runtime. Observers registered with
/// [`ClientBuilder::observer`] are spawned on the current runtime and are
/// skipped, with a warning, when there is none.
pub struct Client<B, T, F = JsonFormat> {
    inner: Arc<ClientInner<B, T, F>>,
}

impl<B, T, F> Clone for Client<B, T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Client<NotSet, NotSet> {
    /// Creates a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder<NotSet, NotSet> {
        ClientBuilder::new()
    }
}

impl<B, T, F> Client<B, T, F>
where
    B: Backend,
    T: Transport,
    F: Format,
{
    /// Fetches `address` under `policy`.
    ///
    /// Entries older than `expiry` do not answer a cache-first call; `None`
    /// accepts any age. After a failed fetch the cached copy is used
    /// regardless of its age unless
    /// [`fallback_honors_expiry`](ClientConfig::fallback_honors_expiry) is set.
    ///
    /// The error, when there is one, is the transport's own error inside
    /// [`FetchError::Transport`], or a timeout or decode failure.
    pub async fn fetch<V>(
        &self,
        address: &ResourceAddress,
        policy: CachePolicy,
        expiry: Option<Duration>,
    ) -> Result<V, FetchError<T::Error>>
    where
        V: DeserializeOwned + Send,
    {
        let inner = &*self.inner;
        let _lock = inner.locks.acquire(address).await;

        let mut cached = None;
        if policy.is_cache_first() {
            let entry = self.read_cached::<V>(address).await;
            let valid = entry
                .as_ref()
                .is_some_and(|(entry, _)| entry.is_valid_now(expiry));
            match (engine::precheck(policy, valid), entry) {
                (Precheck::ServeCache, Some((_, value))) => {
                    debug!(%address, policy = policy.as_str(), "Serving valid cached entry");
                    metrics::record_outcome(Outcome::ShortCircuit);
                    return Ok(value);
                }
                (_, entry) => cached = entry,
            }
        }

        debug!(%address, policy = policy.as_str(), "Fetching fresh data");
        let executor = FetchExecutor::new(
            &inner.backend,
            &inner.transport,
            &inner.format,
            inner.config.timeout,
        );
        let error = match executor.attempt::<V>(address).await {
            FetchOutcome::Success(value) => {
                metrics::record_outcome(Outcome::Fresh);
                return Ok(value);
            }
            FetchOutcome::Failure(error) => error,
        };

        if cached.is_none() && policy.allows_fallback() {
            cached = self.read_cached::<V>(address).await;
        }
        let fallback_expiry = if inner.config.fallback_honors_expiry {
            expiry
        } else {
            None
        };
        let cache_valid = policy.allows_fallback()
            && cached
                .as_ref()
                .is_some_and(|(entry, _)| entry.is_valid_now(fallback_expiry));

        match (
            engine::on_failure(policy, cache_valid, inner.config.error_action),
            cached,
        ) {
            (Decision::ServeCache { notify }, Some((entry, value))) => {
                warn!(
                    %address,
                    policy = policy.as_str(),
                    %error,
                    modified = %entry.modified(),
                    "Fetch failed, serving cached entry"
                );
                if notify {
                    inner.notifier.emit(DegradeNotice::cached(
                        address.clone(),
                        entry,
                        inner.config.stale_data_warning.clone(),
                    ));
                }
                metrics::record_outcome(Outcome::Fallback);
                Ok(value)
            }
            (decision, _) => {
                warn!(%address, policy = policy.as_str(), kind = error.kind(), %error, "Fetch failed");
                if decision.notifies() {
                    inner
                        .notifier
                        .emit(DegradeNotice::failed(address.clone(), error.to_string()));
                }
                metrics::record_outcome(Outcome::Failed);
                Err(error)
            }
        }
    }

    /// Fetches `address` with the configured policy and expiry.
    pub async fn get<V>(&self, address: &ResourceAddress) -> Result<V, FetchError<T::Error>>
    where
        V: DeserializeOwned + Send,
    {
        let config = &self.inner.config;
        self.fetch(address, config.policy, config.expiry).await
    }

    /// Deletes the cached entry for `address`.
    ///
    /// Does not wait for in-flight fetches of the same address.
    pub async fn invalidate(&self, address: &ResourceAddress) -> BackendResult<DeleteStatus> {
        self.inner.backend.delete(address).await
    }

    /// Deletes every cached entry, returning how many were removed.
    pub async fn invalidate_all(&self) -> BackendResult<u64> {
        self.inner.backend.delete_all().await
    }

    /// Reads the cached copy of `address` without fetching.
    pub async fn cached<V>(&self, address: &ResourceAddress) -> Option<CacheEntry<V>>
    where
        V: DeserializeOwned + Send,
    {
        self.inner
            .backend
            .read_as::<V, _>(address, &self.inner.format)
            .await
    }

    async fn read_cached<V>(&self, address: &ResourceAddress) -> Option<(CacheEntry<Raw>, V)>
    where
        V: DeserializeOwned + Send,
    {
        let entry = self.inner.backend.get(address).await?;
        match self.inner.format.decode::<V>(entry.payload()) {
            Ok(value) => Some((entry, value)),
            Err(error) => {
                debug!(%address, format = self.inner.format.name(), %error, "Cached entry does not decode");
                None
            }
        }
    }
}

impl<B, T, F> Client<B, T, F> {
    /// Subscribes to degrade notices.
    pub fn subscribe(&self) -> broadcast::Receiver<DegradeNotice> {
        self.inner.notifier.subscribe()
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The per-address lock registry.
    pub fn locks(&self) -> &LockRegistry {
        &self.inner.locks
    }

    /// The storage backend.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }
}

impl<B, T, F> fmt::Debug for Client<B, T, F>
where
    F: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("format", &self.inner.format)
            .field("config", &self.inner.config)
            .field("locks", &self.inner.locks)
            .field("notifier", &self.inner.notifier)
            .finish_non_exhaustive()
    }
}

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, the corresponding builder
/// method has not been called yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSet;

/// Builder for [`Client`].
///
/// Backend and transport are required; everything else has a default.
pub struct ClientBuilder<B, T, F = JsonFormat> {
    backend: B,
    transport: T,
    format: F,
    config: ClientConfig,
    locks: Option<LockRegistry>,
    observers: Vec<Arc<dyn Observer>>,
}

impl ClientBuilder<NotSet, NotSet> {
    /// Creates a builder with no backend and no transport.
    pub fn new() -> Self {
        Self {
            backend: NotSet,
            transport: NotSet,
            format: JsonFormat,
            config: ClientConfig::default(),
            locks: None,
            observers: Vec::new(),
        }
    }
}

impl Default for ClientBuilder<NotSet, NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, T, F> ClientBuilder<B, T, F> {
    /// Sets the storage backend.
    pub fn backend<NB: Backend>(self, backend: NB) -> ClientBuilder<NB, T, F> {
        ClientBuilder {
            backend,
            transport: self.transport,
            format: self.format,
            config: self.config,
            locks: self.locks,
            observers: self.observers,
        }
    }

    /// Sets the transport.
    pub fn transport<NT: Transport>(self, transport: NT) -> ClientBuilder<B, NT, F> {
        ClientBuilder {
            backend: self.backend,
            transport,
            format: self.format,
            config: self.config,
            locks: self.locks,
            observers: self.observers,
        }
    }

    /// Sets the payload format. Defaults to [`JsonFormat`].
    pub fn format<NF: Format>(self, format: NF) -> ClientBuilder<B, T, NF> {
        ClientBuilder {
            backend: self.backend,
            transport: self.transport,
            format,
            config: self.config,
            locks: self.locks,
            observers: self.observers,
        }
    }

    /// Sets the configuration.
    pub fn config(self, config: ClientConfig) -> Self {
        Self { config, ..self }
    }

    /// Shares an existing lock registry, e.g. between clients over one store.
    pub fn locks(self, locks: LockRegistry) -> Self {
        Self {
            locks: Some(locks),
            ..self
        }
    }

    /// Registers an observer for degrade notices.
    pub fn observer(mut self, observer: impl Observer) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }
}

impl<B, T, F> ClientBuilder<B, T, F>
where
    B: Backend,
    T: Transport,
    F: Format,
{
    /// Builds the [`Client`].
    pub fn build(self) -> Client<B, T, F> {
        let locks = self
            .locks
            .unwrap_or_else(|| LockRegistry::new(self.config.locks));
        let notifier = Notifier::new(self.config.notify_capacity, self.observers);
        Client {
            inner: Arc::new(ClientInner {
                backend: self.backend,
                transport: self.transport,
                format: self.format,
                config: self.config,
                locks,
                notifier,
            }),
        }
    }
}
