use oasis_core_common::{crypto::Hash, SignatureBundle};

use crate::host::Batch;

pub const TXN_SCHEDULER_COMMITMENT_CONTEXT: &[u8] = b"oasis-core/node: txn scheduler commitment";

/// A transaction-scheduler leader's commitment to a batch's ordering,
/// forwarded to the executor committee for execution. Distinct from
/// [`oasis_core_roothash::types::OpenCommitment`], which commits to a
/// batch's *execution results* rather than its proposed order. Passed by
/// local handle between committee-node roles rather than over the wire,
/// so it carries the batch itself rather than a hash of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledBatch {
    pub round: u64,
    pub input_hash: Hash,
    pub batch: Batch,
    pub signature: SignatureBundle,
}

