//! Payload serialization formats.
//!
//! Cache entries hold the raw response body. A [`Format`] turns that body
//! into the caller's type and back. Decoding failures are ordinary values
//! here; the orchestrator treats an undecodable cached entry as absent.

use keepsake_core::Raw;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod json;

pub use json::JsonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Serialization collaborator used for payloads.
pub trait Format: Send + Sync + std::fmt::Debug {
    /// Decode `data` into `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, FormatError>;

    /// Encode `value` into bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Raw, FormatError>;

    /// Format name for logs.
    fn name(&self) -> &'static str;

    /// Decode, mapping any failure to `None`.
    fn decode_opt<T: DeserializeOwned>(&self, data: &[u8]) -> Option<T> {
        self.decode(data).ok()
    }
}

impl<F: Format> Format for &F {
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, FormatError> {
        (**self).decode(data)
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Raw, FormatError> {
        (**self).encode(value)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
