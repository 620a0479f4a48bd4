//! Wire types for the consensus adapter boundary: transactions, blocks,
//! events and the typed request/response pair every [`crate::app::ConsensusApp`]
//! handler exchanges with the multiplexer.
use serde::{Deserialize, Serialize};

use oasis_core_common::{crypto::Hash, Namespace, Signed};

pub const TRANSACTION_SIGNATURE_CONTEXT: &[u8] = b"oasis-core/consensus: tx";

/// Fee a submitter offers to have a transaction included and executed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: oasis_core_common::Quantity,
    pub gas: u64,
}

/// A single state-mutating call into one application, identified by
/// `method` (e.g. `"registry.RegisterEntity"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub fee: Fee,
    pub method: String,
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
}

pub type SignedTransaction = Signed<Transaction>;

/// Outcome of admitting a transaction into the mempool (`check_tx`):
/// cheap, speculative validation against the last committed state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckResult {
    Accepted,
    Rejected(String),
}

/// Outcome of executing a transaction inside a block (`deliver_tx`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliverResult {
    Ok(Vec<u8>),
    Failed(String),
}

/// A typed attribute emitted by an app's `execute_tx`/`end_block`, consumed
/// by watchers and the transaction indexer. `key`/`value` are the app's own
/// opaque encoding; `app` and `round_event` let the reindexer and the
/// blessed-app peer filter route without decoding the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub app: &'static str,
    pub kind: &'static str,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

/// A committed consensus block: enough to chain history and to resolve
/// `get_block`/`watch_blocks` without touching application state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusBlock {
    pub height: i64,
    pub hash: Hash,
    pub previous_hash: Hash,
    pub time: u64,
}

/// Everything `end_block` produced for one height, keyed for reindexing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResults {
    pub height: i64,
    pub events: Vec<Event>,
}

/// Body of a finalized-round event, as emitted by the roothash app and
/// consumed by the reindexer and client watchers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFinalized {
    pub id: Namespace,
    pub round: u64,
}

pub const EVENT_KIND_FINALIZED: &str = "finalized";
