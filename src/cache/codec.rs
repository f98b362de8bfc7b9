//! JSON codec for cache payloads.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use super::store::CacheError;

/// Outcome of reading a typed entry from the cache.
///
/// `Miss` and `Corrupt` both send the caller to the authoritative load path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
    Corrupt,
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes, CacheError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|err| CacheError::Codec(err.to_string()))
}

pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(payload)
}
