//! Content-addressed storage: a named interface over the Merkle KV engine,
//! which is out of scope for this core (see the system's non-goals).
mod backend;
mod error;
mod receipt;

pub use backend::{hash_storage_key, MemoryStorage, Storage};
pub use error::StorageError;
pub use receipt::{sign_receipt, verify_receipt, ReceiptBody, StorageReceipt, RECEIPT_SIGNATURE_CONTEXT};
