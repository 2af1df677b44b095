//! Metrics declaration and recording.
//!
//! Names are registered lazily on first use. Without the `metrics` feature
//! the recording functions are empty and compile away.

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Fetch outcomes by label (`fresh`, `cached`, `short_circuit`, `failed`).
    pub static ref FETCH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "keepsake_fetch_total",
            "Total number of fetch calls by outcome."
        );
        "keepsake_fetch_total"
    };
    /// Cached payloads served by reason (`valid`, `fallback`).
    pub static ref CACHE_SERVED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "keepsake_cache_served_total",
            "Total number of cached payloads returned instead of fresh data."
        );
        "keepsake_cache_served_total"
    };
    /// Degrade notices broadcast.
    pub static ref NOTIFICATIONS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "keepsake_notifications_total",
            "Total number of degrade notices emitted."
        );
        "keepsake_notifications_total"
    };
    /// Histogram of transport call duration.
    pub static ref TRANSPORT_DURATION: &'static str = {
        metrics::describe_histogram!(
            "keepsake_transport_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of transport calls in seconds."
        );
        "keepsake_transport_duration_seconds"
    };
}

/// How a fetch call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fresh data from the transport.
    Fresh,
    /// A valid entry answered before any network call.
    ShortCircuit,
    /// Cached data served after a failed fetch.
    Fallback,
    /// The fetch error was raised.
    Failed,
}

impl Outcome {
    /// Metric label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Fresh => "fresh",
            Outcome::ShortCircuit => "short_circuit",
            Outcome::Fallback => "cached",
            Outcome::Failed => "failed",
        }
    }
}

/// Records the end of a fetch call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_outcome(outcome: Outcome) {
    metrics::counter!(*FETCH_COUNTER, "outcome" => outcome.as_str()).increment(1);
    let reason = match outcome {
        Outcome::ShortCircuit => "valid",
        Outcome::Fallback => "fallback",
        Outcome::Fresh | Outcome::Failed => return,
    };
    metrics::counter!(*CACHE_SERVED_COUNTER, "reason" => reason).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_outcome(_outcome: Outcome) {}

/// Records one broadcast notice.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_notification() {
    metrics::counter!(*NOTIFICATIONS_COUNTER).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_notification() {}

/// Records the duration of one transport call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_transport(duration: Duration, ok: bool) {
    metrics::histogram!(*TRANSPORT_DURATION, "ok" => if ok { "true" } else { "false" })
        .record(duration.as_secs_f64());
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_transport(_duration: Duration, _ok: bool) {}
