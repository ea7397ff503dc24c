//! JSON cache codec for single entities and ordered entity lists.
//!
//! Cache entries are a serialized mirror of what the search store returned,
//! not a derived projection:
//!
//! ```text
//! single entity  key "<id>"                 → {"id":"f1","title":"Dune"}
//! list           key "<index>:<canonical>"  → [{"id":"f1",...},{"id":"f2",...}]
//! ```
//!
//! List order is significant (it encodes relevance/sort order) and is
//! preserved exactly.
//!
//! # Safety Guarantees
//!
//! - **Deterministic:** same value always produces identical bytes
//! - **Validated:** malformed bytes are a `DeserializationError`, never a miss

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize one entity for the cache.
///
/// # Errors
/// Returns `Error::SerializationError` if the entity cannot be encoded.
pub fn encode_entity<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::SerializationError(e.to_string()))
}

/// Deserialize one entity from cache bytes.
///
/// # Errors
/// Returns `Error::DeserializationError` if the bytes do not match `T`.
pub fn decode_entity<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        Error::DeserializationError(format!("cached entity is malformed: {}", e))
    })
}

/// Serialize an ordered list of entities as a single cache value.
///
/// # Errors
/// Returns `Error::SerializationError` if any entity cannot be encoded.
pub fn encode_list<T: Serialize>(values: &[T]) -> Result<Vec<u8>> {
    serde_json::to_vec(values).map_err(|e| Error::SerializationError(e.to_string()))
}

/// Deserialize an ordered list of entities from cache bytes.
///
/// # Errors
/// Returns `Error::DeserializationError` if the bytes are not a list of `T`.
pub fn decode_list<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::DeserializationError(format!("cached list is malformed: {}", e)))
}
