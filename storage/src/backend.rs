//! Content-addressed storage interface.
//!
//! Grounded on `storage/base/src/backend.rs`'s `StorageBackend` trait
//! (`get`/`insert` keyed by a SHA-512/256 hash of the value), generalized
//! from its `BoxFuture`/`ring`-digest shape onto a synchronous trait over
//! `oasis-core-common::crypto::Hash`, since the Merkle KV engine itself
//! (urkel) is out of scope and this crate only needs a content-addressed
//! get/insert surface for inputs, outputs and state roots.
use std::{
    collections::HashMap,
    sync::Mutex,
};

use oasis_core_common::crypto::Hash;

use crate::error::StorageError;

pub trait Storage: Send + Sync {
    /// Fetch the value previously stored under `hash_storage_key(value)`.
    fn get(&self, key: Hash) -> Result<Vec<u8>, StorageError>;

    /// Store a value, keyed by its content hash. Idempotent: inserting the
    /// same bytes twice returns the same key without duplicating storage.
    fn insert(&self, value: Vec<u8>) -> Hash;

    /// Store a batch of values in one call, returning each one's key in
    /// the same order as `values` — used by the committee node loop to
    /// upload every input/output blob a round produced in a single pass.
    fn insert_batch(&self, values: Vec<Vec<u8>>) -> Vec<Hash> {
        values.into_iter().map(|value| self.insert(value)).collect()
    }
}

/// The hash algorithm every backend must use to derive a key from a value.
pub fn hash_storage_key(value: &[u8]) -> Hash {
    Hash::digest_bytes(value)
}

/// In-memory backend. Grounded on `storage/dummy/src/backend.rs`'s
/// `DummyStorageBackend` (a `Mutex<HashMap<H256, Vec<u8>>>`), dropping its
/// unused `expiry`/`get_key_list` parameters since nothing in this system
/// exercises per-value expiry outside the registry's own epoch-scoped
/// expiration sweep.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<Hash, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: Hash) -> Result<Vec<u8>, StorageError> {
        self.values
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn insert(&self, value: Vec<u8>) -> Hash {
        let key = hash_storage_key(&value);
        self.values.lock().unwrap().entry(key).or_insert(value);
        key
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insert_then_get_roundtrips() {
        let storage = MemoryStorage::new();
        let key = storage.insert(b"hello".to_vec());
        assert_eq!(storage.get(key).unwrap(), b"hello");
    }

    #[test]
    fn test_get_missing_key_not_found() {
        let storage = MemoryStorage::new();
        assert!(matches!(storage.get(Hash::empty_hash()), Err(StorageError::NotFound)));
    }

    #[test]
    fn test_insert_is_content_addressed_and_idempotent() {
        let storage = MemoryStorage::new();
        let a = storage.insert(b"same".to_vec());
        let b = storage.insert(b"same".to_vec());
        assert_eq!(a, b);
    }
}
