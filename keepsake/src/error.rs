use std::time::Duration;

use keepsake_backend::format::FormatError;
use thiserror::Error;

/// Why a fetch produced no fresh data.
///
/// `Transport` carries the transport's own error untouched: it displays and
/// reports its source exactly like the inner error, and
/// [`into_transport`](FetchError::into_transport) hands it back by value.
#[derive(Debug, Error)]
pub enum FetchError<E> {
    /// The transport call failed.
    #[error(transparent)]
    Transport(E),

    /// The transport answered, but the body does not decode into the
    /// requested type. Such a body is never written to the cache.
    #[error("response body can not be decoded: {0}")]
    Decode(#[source] FormatError),

    /// The transport did not answer within the configured timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl<E> FetchError<E> {
    /// The transport error, if this is one.
    pub fn transport_error(&self) -> Option<&E> {
        match self {
            FetchError::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Takes the transport error out, or returns `self` unchanged.
    pub fn into_transport(self) -> Result<E, Self> {
        match self {
            FetchError::Transport(e) => Ok(e),
            other => Err(other),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Decode(_) => "decode",
            FetchError::Timeout(_) => "timeout",
        }
    }
}
