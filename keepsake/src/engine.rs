//! Fresh-vs-cache-vs-fail decisions.
//!
//! Pure functions from policy, cache validity and error action to a
//! decision. No I/O happens here; the client feeds in what it observed
//! and carries out what comes back.
//!
//! | Policy | cache valid | cache invalid or absent |
//! |---|---|---|
//! | `FreshOrCacheOrFail` | serve cache, notify if `IgnoreAndNotify` | raise, notify if `IgnoreAndNotify` |
//! | `CacheOrFreshOrFail` | serve cache | raise, notify if `IgnoreAndNotify` |
//! | `FreshOrFail` | raise, notify if `IgnoreAndNotify` | raise, notify if `IgnoreAndNotify` |
//!
//! A successful fetch always wins and never reaches [`on_failure`].

use keepsake_core::{CachePolicy, ErrorAction};

/// What to do before touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precheck {
    /// A valid entry satisfies the request; skip the fetch.
    ServeCache,
    /// Attempt a fetch.
    Fetch,
}

/// What to do after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Return the cached payload.
    ServeCache {
        /// Broadcast a notice carrying the cached entry first.
        notify: bool,
    },
    /// Return the original fetch error.
    Raise {
        /// Broadcast a notice carrying the error message first.
        notify: bool,
    },
}

impl Decision {
    /// Whether a notice is broadcast before the outcome is returned.
    pub fn notifies(&self) -> bool {
        match self {
            Decision::ServeCache { notify } | Decision::Raise { notify } => *notify,
        }
    }
}

/// Decides whether the cache answers without a fetch.
pub fn precheck(policy: CachePolicy, cache_valid: bool) -> Precheck {
    if policy.is_cache_first() && cache_valid {
        Precheck::ServeCache
    } else {
        Precheck::Fetch
    }
}

/// Resolves a failed fetch.
pub fn on_failure(policy: CachePolicy, cache_valid: bool, action: ErrorAction) -> Decision {
    let notify = action.notifies();
    match policy {
        CachePolicy::FreshOrCacheOrFail if cache_valid => Decision::ServeCache { notify },
        CachePolicy::CacheOrFreshOrFail if cache_valid => Decision::ServeCache { notify: false },
        CachePolicy::FreshOrCacheOrFail
        | CachePolicy::CacheOrFreshOrFail
        | CachePolicy::FreshOrFail => Decision::Raise { notify },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CachePolicy::*;
    use ErrorAction::*;

    #[test]
    fn test_precheck_only_short_circuits_cache_first() {
        assert_eq!(precheck(CacheOrFreshOrFail, true), Precheck::ServeCache);
        assert_eq!(precheck(CacheOrFreshOrFail, false), Precheck::Fetch);
        assert_eq!(precheck(FreshOrCacheOrFail, true), Precheck::Fetch);
        assert_eq!(precheck(FreshOrFail, true), Precheck::Fetch);
    }

    #[test]
    fn test_failure_table() {
        let cases = [
            (FreshOrCacheOrFail, true, Throw, Decision::ServeCache { notify: false }),
            (FreshOrCacheOrFail, true, Ignore, Decision::ServeCache { notify: false }),
            (FreshOrCacheOrFail, true, IgnoreAndNotify, Decision::ServeCache { notify: true }),
            (FreshOrCacheOrFail, false, Throw, Decision::Raise { notify: false }),
            (FreshOrCacheOrFail, false, Ignore, Decision::Raise { notify: false }),
            (FreshOrCacheOrFail, false, IgnoreAndNotify, Decision::Raise { notify: true }),
            (CacheOrFreshOrFail, true, Throw, Decision::ServeCache { notify: false }),
            (CacheOrFreshOrFail, true, Ignore, Decision::ServeCache { notify: false }),
            (CacheOrFreshOrFail, true, IgnoreAndNotify, Decision::ServeCache { notify: false }),
            (CacheOrFreshOrFail, false, Throw, Decision::Raise { notify: false }),
            (CacheOrFreshOrFail, false, Ignore, Decision::Raise { notify: false }),
            (CacheOrFreshOrFail, false, IgnoreAndNotify, Decision::Raise { notify: true }),
            (FreshOrFail, true, Throw, Decision::Raise { notify: false }),
            (FreshOrFail, true, Ignore, Decision::Raise { notify: false }),
            (FreshOrFail, true, IgnoreAndNotify, Decision::Raise { notify: true }),
            (FreshOrFail, false, Throw, Decision::Raise { notify: false }),
            (FreshOrFail, false, Ignore, Decision::Raise { notify: false }),
            (FreshOrFail, false, IgnoreAndNotify, Decision::Raise { notify: true }),
        ];

        for (policy, cache_valid, action, expected) in cases {
            assert_eq!(
                on_failure(policy, cache_valid, action),
                expected,
                "{policy:?} valid={cache_valid} {action:?}"
            );
        }
    }

    #[test]
    fn test_fresh_or_fail_never_serves_cache() {
        for action in [Throw, Ignore, IgnoreAndNotify] {
            assert!(matches!(
                on_failure(FreshOrFail, true, action),
                Decision::Raise { .. }
            ));
        }
    }
}
