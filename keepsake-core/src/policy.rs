//! Cache policy and error action configuration.
//!
//! [`CachePolicy`] decides whether cached or fresh data is preferred;
//! [`ErrorAction`] decides whether a failed fetch is reported to observers.

use serde::{Deserialize, Serialize};

/// How fresh data and the cached copy compete for a single fetch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
pub enum CachePolicy {
    /// Always try the network first; fall back to the cached copy when the
    /// fetch fails; fail when neither is available.
    #[default]
    FreshOrCacheOrFail,
    /// Serve a valid cached copy without touching the network; fetch only
    /// when the cache is missing or expired.
    CacheOrFreshOrFail,
    /// Network only. The cached copy is written but never served.
    FreshOrFail,
}

impl CachePolicy {
    /// Whether the cache is consulted before the network is.
    #[inline]
    pub fn is_cache_first(&self) -> bool {
        matches!(self, CachePolicy::CacheOrFreshOrFail)
    }

    /// Whether a failed fetch may be answered from the cache.
    #[inline]
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, CachePolicy::FreshOrFail)
    }

    /// Returns a static label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::FreshOrCacheOrFail => "fresh_or_cache_or_fail",
            CachePolicy::CacheOrFreshOrFail => "cache_or_fresh_or_fail",
            CachePolicy::FreshOrFail => "fresh_or_fail",
        }
    }
}

/// What to do when a fetch fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Default)]
pub enum ErrorAction {
    /// Raise the original error when no fallback exists.
    #[default]
    Throw,
    /// Same resolution as `Throw`; the failure is only logged.
    Ignore,
    /// Same resolution, but broadcast a degrade notice first.
    IgnoreAndNotify,
}

impl ErrorAction {
    /// Whether this action broadcasts degrade notices.
    #[inline]
    pub fn notifies(&self) -> bool {
        matches!(self, ErrorAction::IgnoreAndNotify)
    }
}
