use bytes::Bytes;
use keepsake_core::Raw;
use serde::{Serialize, de::DeserializeOwned};

use super::{Format, FormatError};

/// JSON format (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, FormatError> {
        serde_json::from_slice(data).map_err(|e| FormatError::Deserialize(Box::new(e)))
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Raw, FormatError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| FormatError::Serialize(Box::new(e)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
