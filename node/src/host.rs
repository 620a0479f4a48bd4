//! The boundary between the committee node loop and the sandboxed runtime
//! worker. `runtime/src/protocol.rs`'s `Body` enum and `Protocol::make_request`
//! drive the real worker-host wire protocol over a Unix socket; that
//! protocol is out of scope here (per the Non-goals), so `RuntimeHost`
//! stands in for it as a single async call a node makes to get a batch
//! executed, whatever transport actually backs it.
use async_trait::async_trait;
use oasis_core_common::{crypto::Hash, Namespace};

/// Opaque, runtime-defined transaction bodies collected by the
/// transaction scheduler leader. Unrelated to [`oasis_core_consensus::types::Transaction`],
/// which carries consensus-level (registry/roothash/staking) method calls;
/// these are application payloads the compute runtime alone interprets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch(pub Vec<Vec<u8>>);

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn byte_size(&self) -> usize {
        self.0.iter().map(|tx| tx.len()).sum()
    }

    pub fn input_hash(&self) -> Hash {
        Hash::digest_bytes(&oasis_core_common::cbor::to_vec(&self.0))
    }
}

/// Which round, on which runtime, a batch is being executed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundContext {
    pub runtime_id: Namespace,
    pub round: u64,
    pub previous_hash: Hash,
}

/// The runtime host's verdict on an executed batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchResult {
    pub outputs: Vec<Vec<u8>>,
    pub state_root: Hash,
    pub messages: Vec<oasis_core_roothash::types::Message>,
}

impl BatchResult {
    pub fn output_hash(&self) -> Hash {
        Hash::digest_bytes(&oasis_core_common::cbor::to_vec(&self.outputs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("runtime host rejected the batch: {0}")]
    Rejected(String),
    #[error("runtime host is unreachable")]
    Unreachable,
}

/// A sandboxed runtime worker the node loop dispatches batches to.
/// Implementations own whatever transport (a worker-host socket, an
/// in-process WASM engine, ...) actually executes the batch.
#[async_trait]
pub trait RuntimeHost: Send + Sync {
    async fn execute_batch(&self, round_ctx: RoundContext, batch: Batch) -> Result<BatchResult, HostError>;
}

/// Deterministic stand-in used by tests and single-node deployments: every
/// input is echoed back verbatim and the state root folds in the batch's
/// input hash, so repeated runs over the same inputs are reproducible.
pub struct EchoRuntimeHost;

#[async_trait]
impl RuntimeHost for EchoRuntimeHost {
    async fn execute_batch(&self, round_ctx: RoundContext, batch: Batch) -> Result<BatchResult, HostError> {
        let mut buf = round_ctx.previous_hash.as_bytes().to_vec();
        buf.extend_from_slice(batch.input_hash().as_bytes());
        Ok(BatchResult {
            outputs: batch.0,
            state_root: Hash::digest_bytes(&buf),
            messages: Vec::new(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_echo_host_returns_inputs_as_outputs() {
        let host = EchoRuntimeHost;
        let batch = Batch(vec![b"a".to_vec(), b"b".to_vec()]);
        let ctx = RoundContext {
            runtime_id: Namespace::from_bytes([1u8; 32]),
            round: 1,
            previous_hash: Hash::empty_hash(),
        };
        let result = host.execute_batch(ctx, batch.clone()).await.unwrap();
        assert_eq!(result.outputs, batch.0);
    }
}
