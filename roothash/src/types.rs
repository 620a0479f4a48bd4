//! Runtime block, header and commitment wire types.
//!
//! Field-for-field grounded on the teacher's
//! `runtime/src/consensus/roothash.rs`: `Header`/`HeaderType`/`Block`/
//! `AnnotatedBlock`/`ComputeResultsHeader` carry the same fields and the
//! same `encoded_hash` convention. `Message`/`StakingMessage` are
//! generalized from the teacher's enum to this crate's own
//! `oasis-core-ledger` staking operations instead of the teacher's
//! `consensus::staking` module.
use oasis_core_common::{crypto::Hash, Namespace, PublicKey, Quantity, SignatureBundle};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedBlock {
    pub consensus_height: i64,
    pub block: Block,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum HeaderType {
    Invalid = 0,
    Normal = 1,
    RoundFailed = 2,
    EpochTransition = 3,
    Suspended = 4,
}

impl Default for HeaderType {
    fn default() -> Self {
        HeaderType::Invalid
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingMessage {
    Transfer { to: PublicKey, amount: Quantity },
    Withdraw { from: PublicKey, amount: Quantity },
    AddEscrow { amount: Quantity },
    ReclaimEscrow { shares: Quantity },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Staking(StakingMessage),
}

impl Message {
    pub fn messages_hash(msgs: &[Message]) -> Hash {
        if msgs.is_empty() {
            return Hash::empty_hash();
        }
        Hash::digest_bytes(&oasis_core_common::cbor::to_vec(&msgs))
    }
}

/// Finalized runtime block header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u16,
    pub namespace: Namespace,
    pub round: u64,
    pub timestamp: u64,
    pub header_type: HeaderType,
    pub previous_hash: Hash,
    /// I/O merkle root, the teacher's single combined commitment to this
    /// round's inputs and outputs.
    pub io_root: Hash,
    /// Separately addressable input/output blob hashes, carried alongside
    /// `io_root` so callers (the client watcher, the indexer) can fetch
    /// each blob from storage without reconstructing them from the root.
    pub input_hash: Hash,
    pub output_hash: Hash,
    pub state_root: Hash,
    pub messages_hash: Hash,
    pub storage_signatures: Option<Vec<SignatureBundle>>,
}

impl Header {
    pub fn encoded_hash(&self) -> Hash {
        Hash::digest_bytes(&oasis_core_common::cbor::to_vec(self))
    }
}

pub const COMPUTE_RESULTS_HEADER_CONTEXT: &[u8] = b"oasis-core/roothash: compute results header";

/// Compressed representation of a computed batch's output, carried by a
/// commitment. `input_hash`/`output_hash` are kept separate here (spec.md
/// vocabulary); only the finalized [`Header`] collapses them into one
/// `io_root`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResultsHeader {
    pub round: u64,
    pub previous_hash: Hash,
    pub input_hash: Option<Hash>,
    pub output_hash: Option<Hash>,
    pub state_root: Option<Hash>,
    pub messages_hash: Option<Hash>,
}

impl ComputeResultsHeader {
    pub fn encoded_hash(&self) -> Hash {
        Hash::digest_bytes(&oasis_core_common::cbor::to_vec(self))
    }

    /// The combined I/O root a finalized [`Header`] would carry for this
    /// batch.
    pub fn io_root(&self) -> Hash {
        match (self.input_hash, self.output_hash) {
            (None, None) => Hash::empty_hash(),
            (input, output) => {
                let mut buf = Vec::with_capacity(64);
                buf.extend_from_slice(input.unwrap_or_else(Hash::empty_hash).as_bytes());
                buf.extend_from_slice(output.unwrap_or_else(Hash::empty_hash).as_bytes());
                Hash::digest_bytes(&buf)
            }
        }
    }
}

/// A committee member's opened commitment to a `ComputeResultsHeader`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenCommitment {
    pub header: ComputeResultsHeader,
    pub signature: SignatureBundle,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDiscrepancyDetected {
    pub input_hash: Hash,
    pub header: Header,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDiscrepancyDetected {
    pub header: Header,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundFailed {
    pub round: u64,
    pub header: Header,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_header_hash_changes_with_round() {
        let mut header = Header::default();
        let empty_hash = header.encoded_hash();
        header.round = 1;
        assert_ne!(header.encoded_hash(), empty_hash);
    }

    #[test]
    fn test_messages_hash_empty() {
        assert_eq!(Message::messages_hash(&[]), Hash::empty_hash());
    }
}
