//! CBOR serialization for packed transactions and state snapshots.
//!
//! - Use CBOR via `ciborium` (NOT JSON or bincode)
//! - Deterministic serialization, so proposal digests are stable
//! - Items can be concatenated and read back one at a time, which is how a
//!   transaction header is decoded without parsing the body
//! - Schema evolution with #[serde(default)]

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    append_cbor(value, &mut bytes)?;
    Ok(bytes)
}

/// Append one CBOR item to an existing buffer.
pub fn append_cbor<T: Serialize>(value: &T, out: &mut Vec<u8>) -> Result<(), SerializationError> {
    ciborium::into_writer(value, out).map_err(|e| SerializationError::Encode(format!("{:?}", e)))
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}

/// Read the next CBOR item and advance `input` past it.
///
/// Trailing bytes are left in `input` for the next call.
pub fn next_cbor<T: DeserializeOwned>(input: &mut &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(&mut *input).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}
