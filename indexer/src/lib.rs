//! Durable transaction index: `(runtime_id, round, index)` primary key,
//! `tx_hash`/`block_hash` secondary indices, optional tag search.
mod error;
mod state;
mod types;

pub use error::IndexerError;
pub use state::Indexer;
pub use types::{IndexedTransaction, NewTransaction, Query};
