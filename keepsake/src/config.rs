//! Client configuration.
//!
//! [`ClientConfig`] holds the per-client defaults: which [`CachePolicy`]
//! applies when a call does not name one, how long entries stay valid,
//! what a failure does and how the concurrency guard is bounded. It
//! deserializes from any serde format, with durations written the
//! human way (`"5m"`, `"1h 30m"`, `"500ms"`).
//!
//! ```
//! use std::time::Duration;
//! use keepsake::{CachePolicy, ClientConfig, ErrorAction};
//!
//! let config = ClientConfig::default()
//!     .policy(CachePolicy::CacheOrFreshOrFail)
//!     .expiry(Duration::from_secs(300))
//!     .error_action(ErrorAction::IgnoreAndNotify);
//! assert_eq!(config.expiry, Some(Duration::from_secs(300)));
//! ```

use std::time::Duration;

use bounded_integer::bounded_integer;
use keepsake_core::{CachePolicy, ErrorAction};
use serde::{Deserialize, Serialize};

/// Warning attached to notices that serve cached data.
pub const DEFAULT_STALE_DATA_WARNING: &str =
    "The latest data cannot be received from the server right now.";

bounded_integer! {
    /// Buffer size of the degrade notice channel (1-4096).
    /// Receivers lagging further behind lose the oldest notices.
    #[repr(u16)]
    pub struct NoticeCapacity { 1..=4096 }
}

/// Bounds for the per-address lock registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct LockConfig {
    /// Number of tracked addresses above which idle locks are pruned.
    /// `None` keeps every lock for the lifetime of the client.
    #[serde(default = "LockConfig::default_max_idle")]
    pub max_idle: Option<usize>,
}

impl LockConfig {
    fn default_max_idle() -> Option<usize> {
        Some(1024)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_idle: Self::default_max_idle(),
        }
    }
}

/// Per-client defaults for fetching.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ClientConfig {
    /// Policy used by [`Client::get`](crate::Client::get).
    #[serde(default)]
    pub policy: CachePolicy,
    /// Maximum age of a usable entry (e.g., "30s", "5m"). Absent means any age.
    #[serde(default, with = "humantime_serde")]
    pub expiry: Option<Duration>,
    /// What a failed fetch does.
    #[serde(default)]
    pub error_action: ErrorAction,
    /// Upper bound for one transport call.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Message attached to notices that serve cached data.
    #[serde(default = "ClientConfig::default_stale_data_warning")]
    pub stale_data_warning: String,
    /// Apply the request expiry to fallback after a failed fetch too.
    #[serde(default)]
    pub fallback_honors_expiry: bool,
    /// Degrade notice channel capacity.
    #[serde(default = "ClientConfig::default_notify_capacity")]
    pub notify_capacity: NoticeCapacity,
    /// Lock registry bounds.
    #[serde(default)]
    pub locks: LockConfig,
}

impl ClientConfig {
    fn default_stale_data_warning() -> String {
        DEFAULT_STALE_DATA_WARNING.to_owned()
    }

    fn default_notify_capacity() -> NoticeCapacity {
        NoticeCapacity::new(64).unwrap_or(NoticeCapacity::MAX)
    }

    /// Sets the default policy.
    pub fn policy(self, policy: CachePolicy) -> Self {
        Self { policy, ..self }
    }

    /// Sets the default expiry.
    pub fn expiry(self, expiry: Duration) -> Self {
        Self {
            expiry: Some(expiry),
            ..self
        }
    }

    /// Sets the error action.
    pub fn error_action(self, error_action: ErrorAction) -> Self {
        Self {
            error_action,
            ..self
        }
    }

    /// Sets the transport timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Sets the message carried by cached-data notices.
    pub fn stale_data_warning(self, message: impl Into<String>) -> Self {
        Self {
            stale_data_warning: message.into(),
            ..self
        }
    }

    /// Makes fallback after a failed fetch respect the request expiry.
    pub fn fallback_honors_expiry(self, honors: bool) -> Self {
        Self {
            fallback_honors_expiry: honors,
            ..self
        }
    }

    /// Sets the lock registry bound.
    pub fn max_idle_locks(self, max_idle: Option<usize>) -> Self {
        Self {
            locks: LockConfig { max_idle },
            ..self
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::default(),
            expiry: None,
            error_action: ErrorAction::default(),
            timeout: None,
            stale_data_warning: Self::default_stale_data_warning(),
            fallback_honors_expiry: false,
            notify_capacity: Self::default_notify_capacity(),
            locks: LockConfig::default(),
        }
    }
}
