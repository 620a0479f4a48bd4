use serde::{Deserialize, Serialize};

use oasis_core_common::{crypto::Hash, Namespace, Round};

/// One transaction as durably recorded by the indexer, addressable by its
/// primary `(runtime_id, round, index)` key or either secondary hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTransaction {
    pub runtime_id: Namespace,
    pub round: Round,
    pub index: u32,
    pub tx_hash: Hash,
    pub block_hash: Hash,
    /// Arbitrary key/value tags emitted alongside the transaction, used by
    /// `query_txn`/`query_txns` to find it without knowing its hash.
    pub tags: Vec<(Vec<u8>, Vec<u8>)>,
}

/// A transaction as handed to [`crate::Indexer::index_block`], before the
/// indexer assigns it a primary-key index within the round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub tx_hash: Hash,
    pub tags: Vec<(Vec<u8>, Vec<u8>)>,
}

/// A conjunctive tag query for `query_txns`: every condition must match
/// (AND), and results are capped at `limit` if set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub conditions: Vec<(Vec<u8>, Vec<u8>)>,
    pub limit: Option<usize>,
}
