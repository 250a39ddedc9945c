//! Object codec
//!
//! Typed values are stored as bincode-encoded byte strings.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

/// Encode a value for storage
pub fn encode_object<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| CacheError::Codec(format!("encode failed: {}", e)))
}

/// Decode a stored value
pub fn decode_object<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| CacheError::Codec(format!("decode failed: {}", e)))
}

/// Decode an optional stored value; a missing value never reaches the codec
pub fn decode_optional<T: DeserializeOwned>(bytes: Option<Vec<u8>>) -> Result<Option<T>> {
    bytes.map(|b| decode_object(&b)).transpose()
}

