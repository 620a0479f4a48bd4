//! Per-runtime committee node loop.
//!
//! Grounded on spec.md §4.6: maintain committee membership across epoch
//! transitions, batch and schedule transactions as the transaction
//! scheduler leader, execute batches as an executor worker/leader or
//! (only on discrepancy) backup worker, upload artifacts to storage when
//! this node's committee owns that responsibility, and re-register with
//! the registry every epoch with unbounded exponential backoff. No
//! teacher file owns this loop directly; `consensus/optimistic/src/lib.rs`
//! is cited for the general "one task per round, reacting to committee
//! and block streams" shape, generalized from its single BFT driver to
//! per-role dispatch over [`crate::host::RuntimeHost`].
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use oasis_core_common::{
    crypto::Hash, EpochTime, MultiSigned, Namespace, PublicKey, Signer,
};
use oasis_core_ledger::Ledger;
use oasis_core_registry::{types::Node, Registry, NODE_SIGNATURE_CONTEXT};
use oasis_core_roothash::{
    types::{Block, ComputeResultsHeader, ExecutionDiscrepancyDetected, OpenCommitment},
    Round, RoundEvent,
};
use oasis_core_scheduler::{types::CommitteeKind, CommitteeSnapshot};
use oasis_core_storage::Storage;
use slog::{debug, warn, Logger};
use tokio::sync::Notify;

use crate::{
    error::NodeError,
    host::{Batch, RoundContext, RuntimeHost},
    retry::Backoff,
    role::{memberships, NodeRole},
    types::{ScheduledBatch, TXN_SCHEDULER_COMMITMENT_CONTEXT},
};

pub struct CommitteeNode {
    runtime_id: Namespace,
    signer: Arc<dyn Signer>,
    host: Arc<dyn RuntimeHost>,
    storage: Arc<dyn Storage>,
    registry: Arc<Mutex<Registry>>,
    ledger: Arc<Ledger>,
    logger: Logger,
    round: Mutex<Option<Round>>,
    roles: Mutex<Vec<(CommitteeKind, NodeRole)>>,
    pending_batches: Mutex<HashMap<u64, Batch>>,
    pub shutdown: Arc<Notify>,
}

impl CommitteeNode {
    pub fn new(
        runtime_id: Namespace,
        signer: Arc<dyn Signer>,
        host: Arc<dyn RuntimeHost>,
        storage: Arc<dyn Storage>,
        registry: Arc<Mutex<Registry>>,
        ledger: Arc<Ledger>,
    ) -> Self {
        CommitteeNode {
            runtime_id,
            signer,
            host,
            storage,
            registry,
            ledger,
            logger: oasis_core_common::logger::get_logger("node::committee"),
            round: Mutex::new(None),
            roles: Mutex::new(Vec::new()),
            pending_batches: Mutex::new(HashMap::new()),
            shutdown: Arc::new(Notify::new()),
        }
    }

    fn node_id(&self) -> PublicKey {
        self.signer.public_key()
    }

    fn has_role(&self, kind: CommitteeKind, role: NodeRole) -> bool {
        self.roles.lock().unwrap().iter().any(|(k, r)| *k == kind && *r == role)
    }

    fn is_executor_member(&self) -> bool {
        self.has_role(CommitteeKind::Executor, NodeRole::Leader)
            || self.has_role(CommitteeKind::Executor, NodeRole::Worker)
            || self.has_role(CommitteeKind::Executor, NodeRole::BackupWorker)
    }

    /// Called on every new committee snapshot (normally once per epoch).
    /// Resets in-flight round state if this node remains an executor
    /// committee member; drops it otherwise.
    pub fn on_committee_snapshot(&self, snapshot: &CommitteeSnapshot, tip: Block) {
        let own_roles = memberships(snapshot, self.runtime_id, &self.node_id());
        *self.roles.lock().unwrap() = own_roles.clone();

        let executor = snapshot.get(&(self.runtime_id, CommitteeKind::Executor));
        let mut round = self.round.lock().unwrap();
        match executor {
            Some(committee) if own_roles.iter().any(|(k, _)| *k == CommitteeKind::Executor) => {
                match round.as_mut() {
                    Some(existing) => existing.refresh(committee.clone(), tip),
                    None => *round = Some(Round::new(tip, committee.clone())),
                }
            }
            _ => *round = None,
        }
        self.pending_batches.lock().unwrap().clear();
    }

    /// Transaction-scheduler-leader step: dispatch a freshly accumulated
    /// batch to the runtime host, and on success sign an ordering
    /// commitment over it for the executor committee to consume.
    pub async fn schedule_batch(&self, round_num: u64, previous_hash: Hash, batch: Batch) -> Result<ScheduledBatch, NodeError> {
        if !self.has_role(CommitteeKind::TxnScheduler, NodeRole::Leader) {
            return Err(NodeError::WrongRole);
        }
        let round_ctx = RoundContext {
            runtime_id: self.runtime_id,
            round: round_num,
            previous_hash,
        };
        // The host call here validates the batch is well-formed before the
        // leader commits to its ordering; the actual state transition runs
        // again, independently, in each executor worker's own execution.
        self.host.execute_batch(round_ctx, batch.clone()).await?;

        let input_hash = batch.input_hash();
        let mut signed_over = round_num.to_be_bytes().to_vec();
        signed_over.extend_from_slice(input_hash.as_bytes());
        let signature = self.signer.sign(TXN_SCHEDULER_COMMITMENT_CONTEXT, &signed_over);

        self.pending_batches.lock().unwrap().insert(round_num, batch.clone());
        Ok(ScheduledBatch {
            round: round_num,
            input_hash,
            batch,
            signature: oasis_core_common::SignatureBundle {
                public_key: self.node_id(),
                signature,
            },
        })
    }

    /// Executor worker/leader step: execute a scheduled batch and submit
    /// the resulting commitment to this runtime's round.
    pub async fn execute_round(&self, scheduled: ScheduledBatch) -> Result<Option<RoundEvent>, NodeError> {
        if !(self.has_role(CommitteeKind::Executor, NodeRole::Leader) || self.has_role(CommitteeKind::Executor, NodeRole::Worker)) {
            return Err(NodeError::WrongRole);
        }
        self.pending_batches.lock().unwrap().insert(scheduled.round, scheduled.batch.clone());
        self.run_batch_and_commit(scheduled.round, scheduled.input_hash, scheduled.batch).await
    }

    /// Backup worker step: only invoked after an
    /// [`RoundEvent::ExecutionDiscrepancyDetected`] event, re-executes the
    /// batch the primary committee disagreed over.
    pub async fn execute_backup_round(&self, discrepancy: ExecutionDiscrepancyDetected) -> Result<Option<RoundEvent>, NodeError> {
        if !self.has_role(CommitteeKind::Executor, NodeRole::BackupWorker) {
            return Err(NodeError::WrongRole);
        }
        let round_num = discrepancy.header.round + 1;
        let batch = self
            .pending_batches
            .lock()
            .unwrap()
            .get(&round_num)
            .cloned()
            .ok_or(NodeError::NoPendingBatch(round_num))?;
        self.run_batch_and_commit(round_num, discrepancy.input_hash, batch).await
    }

    async fn run_batch_and_commit(&self, round_num: u64, input_hash: Hash, batch: Batch) -> Result<Option<RoundEvent>, NodeError> {
        let previous_hash = {
            let guard = self.round.lock().unwrap();
            let round = guard.as_ref().ok_or(NodeError::NoActiveRound)?;
            round.current_block.header.encoded_hash()
        };
        let round_ctx = RoundContext {
            runtime_id: self.runtime_id,
            round: round_num,
            previous_hash,
        };
        let batch_for_storage = batch.clone();
        let result = self.host.execute_batch(round_ctx, batch).await?;

        let header = ComputeResultsHeader {
            round: round_num,
            previous_hash,
            input_hash: Some(input_hash),
            output_hash: Some(result.output_hash()),
            state_root: Some(result.state_root),
            messages_hash: Some(Round::messages_hash(&result.messages)),
        };
        let header_bytes = oasis_core_common::cbor::to_vec(&header);
        let signature = self.signer.sign(oasis_core_roothash::types::COMPUTE_RESULTS_HEADER_CONTEXT, &header_bytes);
        let commitment = OpenCommitment {
            header,
            signature: oasis_core_common::SignatureBundle {
                public_key: self.node_id(),
                signature,
            },
        };

        let event = {
            let mut guard = self.round.lock().unwrap();
            let round = guard.as_mut().ok_or(NodeError::NoActiveRound)?;
            round.submit_commitment(self.node_id(), commitment, now())?
        };

        if let Some(RoundEvent::Finalized(_)) = &event {
            self.upload_round_artifacts(round_num, &batch_for_storage, &result).await;
            self.pending_batches.lock().unwrap().remove(&round_num);
        }
        Ok(event)
    }

    /// If this node's committee owns storage for the runtime, persist the
    /// round's combined input and output blobs (keyed, by content
    /// addressing, under exactly the `input_hash`/`output_hash` the
    /// finalized header carries — see [`crate::host::Batch::input_hash`]
    /// and [`crate::host::BatchResult::output_hash`]) and sign a receipt.
    /// Receipts are not retrofitted into the already-finalized header
    /// (spec.md §4.5's `storage_signatures` is populated by whichever
    /// subsystem forwards the finalized block onward, not by the executor
    /// itself); this method only performs the upload and signs the
    /// attestation.
    async fn upload_round_artifacts(&self, round: u64, batch: &Batch, result: &crate::host::BatchResult) -> Option<oasis_core_storage::StorageReceipt> {
        if !self.has_role(CommitteeKind::Storage, NodeRole::Worker) && !self.has_role(CommitteeKind::Storage, NodeRole::Leader) {
            return None;
        }
        let input_key = self.storage.insert(oasis_core_common::cbor::to_vec(&batch.0));
        let output_key = self.storage.insert(oasis_core_common::cbor::to_vec(&result.outputs));
        let body = oasis_core_storage::ReceiptBody {
            state_root: result.state_root,
            keys: vec![input_key, output_key],
        };
        let receipt = oasis_core_storage::sign_receipt(self.signer.as_ref(), &body);
        debug!(self.logger, "uploaded round artifacts"; "round" => round, "keys" => body.keys.len());
        Some(receipt)
    }

    /// Re-register this node's descriptor with the registry, retrying
    /// with unbounded exponential backoff until it succeeds or
    /// `self.shutdown` is signalled.
    pub async fn reregister(&self, mut descriptor: Node, current_epoch: EpochTime, lifetime_epochs: EpochTime) {
        descriptor.expiration = current_epoch + lifetime_epochs;
        let multi_signed = MultiSigned::sign(&[self.signer.as_ref()], NODE_SIGNATURE_CONTEXT, &descriptor);
        let mut backoff = Backoff::default();
        loop {
            let outcome = {
                let mut registry = self.registry.lock().unwrap();
                registry.register_node(&multi_signed, &self.ledger, current_epoch)
            };
            match outcome {
                Ok(()) => return,
                Err(err) => {
                    warn!(self.logger, "re-registration failed, backing off"; "error" => format!("{}", err));
                    let delay = backoff.next_delay();
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = self.shutdown.notified() => return,
                    }
                }
            }
        }
    }
}

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::host::EchoRuntimeHost;
    use oasis_core_common::{MemorySigner, Namespace as Ns, Signature, Signed};
    use oasis_core_registry::{types::StakeThresholds, ENTITY_SIGNATURE_CONTEXT, RUNTIME_SIGNATURE_CONTEXT};
    use oasis_core_registry::types::{
        Address, Capabilities, CommitteeEndpoint, CommitteeParameters, Entity, NodeRuntime, RuntimeGenesis,
        RuntimeKind, StorageParameters, TEEHardware, TransportEndpoint, TxnSchedulerParameters,
    };
    use oasis_core_scheduler::types::{Committee, CommitteeMember, Role};
    use oasis_core_storage::MemoryStorage;
    use std::collections::BTreeMap;

    fn seeded(n: u8) -> MemorySigner {
        MemorySigner::from_seed(&[n; 32])
    }

    fn runtime_id() -> Ns {
        Namespace::from_bytes([5u8; 32])
    }

    fn executor_snapshot(leader: PublicKey, workers: &[PublicKey]) -> CommitteeSnapshot {
        let mut members = vec![CommitteeMember { role: Role::Leader, public_key: leader }];
        members.extend(workers.iter().map(|k| CommitteeMember { role: Role::Worker, public_key: *k }));
        let mut snapshot = BTreeMap::new();
        snapshot.insert(
            (runtime_id(), CommitteeKind::Executor),
            Committee { kind: CommitteeKind::Executor, runtime_id: runtime_id(), members, valid_for: 1 },
        );
        snapshot
    }

    #[tokio::test]
    async fn test_non_member_has_no_round_after_snapshot() {
        let signer = seeded(1);
        let node = CommitteeNode::new(
            runtime_id(),
            Arc::new(MemorySigner::from_seed(&[1u8; 32])),
            Arc::new(EchoRuntimeHost),
            Arc::new(MemoryStorage::default()),
            Arc::new(Mutex::new(Registry::new(StakeThresholds::default(), true))),
            Arc::new(Ledger::new()),
        );
        let other = seeded(9).public_key();
        let snapshot = executor_snapshot(other, &[]);
        node.on_committee_snapshot(&snapshot, Block::default());
        assert!(node.round.lock().unwrap().is_none());
        let result = node
            .execute_round(ScheduledBatch {
                round: 1,
                input_hash: Hash::empty_hash(),
                batch: Batch(vec![]),
                signature: oasis_core_common::SignatureBundle {
                    public_key: signer.public_key(),
                    signature: Signature::from_bytes([0u8; 64]),
                },
            })
            .await;
        assert!(matches!(result, Err(NodeError::WrongRole)));
    }

    #[tokio::test]
    async fn test_executor_leader_executes_and_finalizes_single_member_committee() {
        let signer = MemorySigner::from_seed(&[7u8; 32]);
        let pk = signer.public_key();
        let node = CommitteeNode::new(
            runtime_id(),
            Arc::new(signer),
            Arc::new(EchoRuntimeHost),
            Arc::new(MemoryStorage::default()),
            Arc::new(Mutex::new(Registry::new(StakeThresholds::default(), true))),
            Arc::new(Ledger::new()),
        );
        let snapshot = executor_snapshot(pk, &[]);
        node.on_committee_snapshot(&snapshot, Block::default());
        assert!(node.is_executor_member());

        let scheduled = ScheduledBatch {
            round: 1,
            input_hash: Batch(vec![b"tx".to_vec()]).input_hash(),
            batch: Batch(vec![b"tx".to_vec()]),
            signature: oasis_core_common::SignatureBundle {
                public_key: pk,
                signature: Signature::from_bytes([0u8; 64]),
            },
        };
        let event = node.execute_round(scheduled).await.unwrap();
        assert!(matches!(event, Some(RoundEvent::Finalized(_))));
    }

    fn node_descriptor(id: PublicKey, entity_id: PublicKey, runtime: Ns) -> Node {
        Node {
            id,
            entity_id,
            expiration: 0,
            roles: oasis_core_registry::types::RolesMask::COMPUTE,
            runtimes: vec![NodeRuntime { id: runtime, capabilities: Capabilities::default() }],
            p2p: TransportEndpoint { id, addresses: vec![] },
            consensus: TransportEndpoint { id, addresses: vec![] },
            committee: CommitteeEndpoint {
                addresses: vec![Address { host: "127.0.0.1".into(), port: 9001 }],
                certificate: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_reregister_succeeds_once_runtime_is_known() {
        let entity_signer = seeded(20);
        let entity = Entity { id: entity_signer.public_key(), allow_entity_signed_nodes: true };
        let mut registry = Registry::new(StakeThresholds::default(), true);
        registry
            .register_entity(&Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity))
            .unwrap();
        let runtime = oasis_core_registry::types::Runtime {
            id: runtime_id(),
            entity_id: entity.id,
            kind: RuntimeKind::Compute,
            tee_hardware: TEEHardware::Invalid,
            version: 1,
            key_manager: None,
            genesis: RuntimeGenesis { state_root: Hash::empty_hash(), round: 0, state_present: false, storage_receipts: vec![] },
            executor: CommitteeParameters { group_size: 1, group_backup_size: 0, allowed_stragglers: 0, round_timeout: 5 },
            merge: CommitteeParameters { group_size: 1, group_backup_size: 0, allowed_stragglers: 0, round_timeout: 5 },
            txn_scheduler: TxnSchedulerParameters { group_size: 1, algorithm: "batching".into(), batch_flush_timeout_ms: 1000, max_batch_size: 10, max_batch_size_bytes: 1 << 16 },
            storage: StorageParameters { group_size: 1, checkpoint_interval: 100, checkpoint_num_kept: 2, checkpoint_chunk_size: 1 << 16 },
            admission_policy: oasis_core_registry::types::AdmissionPolicy::AnyNode,
        };
        registry
            .register_runtime(&Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime))
            .unwrap();

        let node_signer = MemorySigner::from_seed(&[30u8; 32]);
        let node_id = node_signer.public_key();
        let node = CommitteeNode::new(
            runtime_id(),
            Arc::new(node_signer),
            Arc::new(EchoRuntimeHost),
            Arc::new(MemoryStorage::default()),
            Arc::new(Mutex::new(registry)),
            Arc::new(Ledger::new()),
        );

        node.reregister(node_descriptor(node_id, entity.id, runtime_id()), 1, 10).await;
        assert!(node.registry.lock().unwrap().get_node(&node_id).is_some());
    }
}
