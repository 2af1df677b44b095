use thiserror::Error;

use crate::format::FormatError;

/// Why a backend operation failed.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Reading or writing the storage medium failed.
    #[error("cache storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Backend specific failure.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Format(#[from] FormatError),
}
