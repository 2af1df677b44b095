//! Per-address mutual exclusion.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

use crate::ResourceAddress;
use crate::config::LockConfig;

/// Registry of one async mutex per resource address.
///
/// Callers for the same address queue on the same mutex; callers for
/// different addresses never wait on each other. The map is sharded, so
/// creating locks for unrelated addresses does not serialize on one mutex.
///
/// With a `max_idle` bound the registry prunes idle locks once it tracks
/// more addresses than the bound. A lock is idle when nobody holds it and
/// nobody waits for it; pruning never drops a lock in use, so the next
/// caller for a pruned address simply gets a fresh mutex.
///
/// After each pass the next one is due at twice the survivors (never below
/// `max_idle`), so a map full of busy locks is not rescanned on every call.
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<DashMap<ResourceAddress, Arc<Mutex<()>>>>,
    max_idle: Option<usize>,
    prune_at: Arc<AtomicUsize>,
    prune_passes: Arc<AtomicUsize>,
}

impl LockRegistry {
    /// Creates a registry with the given bound.
    pub fn new(config: LockConfig) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            max_idle: config.max_idle,
            prune_at: Arc::new(AtomicUsize::new(config.max_idle.unwrap_or(usize::MAX))),
            prune_passes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a registry that never prunes.
    pub fn unbounded() -> Self {
        Self::new(LockConfig { max_idle: None })
    }

    /// Waits for exclusive access to `address`.
    ///
    /// The returned guard releases the lock when dropped, whichever way the
    /// critical section ends, including cancellation of the awaiting future.
    pub async fn acquire(&self, address: &ResourceAddress) -> ScopedLock {
        let mutex = self
            .locks
            .entry(address.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        self.prune();

        let guard = mutex.lock_owned().await;
        trace!(%address, "Resource lock acquired");
        ScopedLock {
            address: address.clone(),
            _guard: guard,
        }
    }

    /// Number of tracked addresses.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no address is tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Number of prune passes run so far.
    pub fn prune_passes(&self) -> usize {
        self.prune_passes.load(Ordering::Relaxed)
    }

    fn prune(&self) {
        let Some(max_idle) = self.max_idle else {
            return;
        };
        let before = self.locks.len();
        if before <= self.prune_at.load(Ordering::Relaxed) {
            return;
        }
        // Only the map holds an idle lock; holders and waiters own a clone.
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        let after = self.locks.len();
        self.prune_at
            .store(max_idle.max(after.saturating_mul(2)), Ordering::Relaxed);
        self.prune_passes.fetch_add(1, Ordering::Relaxed);
        debug!(before, after, "Pruned idle resource locks");
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRegistry")
            .field("tracked", &self.locks.len())
            .field("max_idle", &self.max_idle)
            .field("prune_at", &self.prune_at.load(Ordering::Relaxed))
            .finish()
    }
}

/// Exclusive access to one address, released on drop.
pub struct ScopedLock {
    address: ResourceAddress,
    _guard: OwnedMutexGuard<()>,
}

impl ScopedLock {
    /// The locked address.
    pub fn address(&self) -> &ResourceAddress {
        &self.address
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        trace!(address = %self.address, "Resource lock released");
    }
}

impl fmt::Debug for ScopedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLock")
            .field("address", &self.address)
            .finish()
    }
}
