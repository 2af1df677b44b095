//! Cache entries and their freshness.
//!
//! An entry is the last successful response for one address together with
//! the time it was written. The timestamp comes from the storage medium
//! (a file's modification time, the moment of an in-memory insert), so
//! storage backends only need to persist the payload itself.
//!
//! ## Validity
//!
//! An entry is valid when no expiry is configured, or when its age is at
//! most the expiry:
//!
//! ```
//! use chrono::{Duration, Utc};
//! use keepsake_core::CacheEntry;
//!
//! let written = Utc::now() - Duration::minutes(1);
//! let entry = CacheEntry::new("payload", written);
//!
//! assert!(entry.is_valid_now(Some(std::time::Duration::from_secs(300))));
//! assert!(!entry.is_valid_now(Some(std::time::Duration::from_secs(30))));
//! assert!(entry.is_valid_now(None));
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A cached payload with its last-write timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    payload: T,
    modified: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Creates an entry written at `modified`.
    pub fn new(payload: T, modified: DateTime<Utc>) -> Self {
        Self { payload, modified }
    }

    /// Returns a reference to the payload.
    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Returns the time of the last write.
    #[inline]
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Consumes the entry and returns the payload.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Transforms the payload, keeping the timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            payload: f(self.payload),
            modified: self.modified,
        }
    }

    /// Age of the entry at `now`. Timestamps from the future count as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.modified).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry satisfies `expiry` at `now`.
    ///
    /// The boundary is inclusive: an entry exactly `expiry` old is valid.
    pub fn is_valid(&self, expiry: Option<Duration>, now: DateTime<Utc>) -> bool {
        match expiry {
            None => true,
            Some(expiry) => self.age(now) <= expiry,
        }
    }

    /// [`is_valid`](Self::is_valid) against the current time.
    pub fn is_valid_now(&self, expiry: Option<Duration>) -> bool {
        self.is_valid(expiry, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn written_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry::new("x", written_at());
        let expiry = Duration::from_secs(300);
        let epsilon = chrono::Duration::milliseconds(1);
        let at_expiry = written_at() + chrono::Duration::seconds(300);

        assert!(entry.is_valid(Some(expiry), at_expiry - epsilon));
        assert!(entry.is_valid(Some(expiry), at_expiry));
        assert!(!entry.is_valid(Some(expiry), at_expiry + epsilon));
    }

    #[test]
    fn test_absent_expiry_accepts_any_age() {
        let entry = CacheEntry::new("x", written_at());
        let much_later = written_at() + chrono::Duration::days(3650);
        assert!(entry.is_valid(None, much_later));
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let entry = CacheEntry::new("x", written_at());
        let before = written_at() - chrono::Duration::seconds(10);
        assert_eq!(entry.age(before), Duration::ZERO);
        assert!(entry.is_valid(Some(Duration::ZERO), before));
    }

    #[test]
    fn test_map_keeps_timestamp() {
        let entry = CacheEntry::new(2, written_at()).map(|n| n * 21);
        assert_eq!(entry.payload(), &42);
        assert_eq!(entry.modified(), written_at());
    }
}
