//! Canonical binary encoding used for every durable and hashed structure.
//!
//! All components MUST go through this module rather than calling into
//! `cbor` directly, so that the encoding used for hashing and the one used
//! for wire transport never drift apart.
use serde::{de::DeserializeOwned, Serialize};

/// Serialize a value using the canonical encoding.
pub fn to_vec<T: Serialize>(value: &T) -> Vec<u8> {
    cbor::to_vec(value)
}

/// Deserialize a value previously produced by [`to_vec`].
pub fn from_slice<T: DeserializeOwned>(slice: &[u8]) -> anyhow::Result<T> {
    cbor::from_slice(slice).map_err(|err| anyhow::anyhow!("malformed canonical encoding: {}", err))
}
