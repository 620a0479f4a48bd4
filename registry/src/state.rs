//! Registry consensus-app state: entity/node/runtime registration, the
//! expiration sweep and stake-claim accounting.
//!
//! Grounded on the teacher's `registry/client/src/entity.rs` (signature
//! verification shape for `register_entity`) and `common/src/node.rs`
//! (field layout), generalized from the old grpcio/protobuf request
//! handlers to plain methods on an in-memory state machine, consensus-app
//! dispatch being out of scope here (§4.5's `ConsensusApp` boundary lives
//! in the `consensus` crate, which calls into this one).
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use oasis_core_common::{EpochTime, MultiSigned, Namespace, PublicKey, Signed};
use oasis_core_ledger::Ledger;
use tokio::sync::broadcast;

use crate::{
    error::RegistryError,
    tee::{AcceptAllTee, Tee},
    types::{AdmissionPolicy, Entity, EntityEvent, Node, NodeEvent, NodeStatus, Runtime, RuntimeEvent, StakeThresholds},
};

pub const ENTITY_SIGNATURE_CONTEXT: &[u8] = b"oasis-core/registry: entity";
pub const NODE_SIGNATURE_CONTEXT: &[u8] = b"oasis-core/registry: node";
pub const RUNTIME_SIGNATURE_CONTEXT: &[u8] = b"oasis-core/registry: runtime";

const WATCH_CHANNEL_CAPACITY: usize = 256;

pub struct Registry {
    entities: HashMap<PublicKey, Entity>,
    nodes: HashMap<PublicKey, Node>,
    node_status: HashMap<PublicKey, NodeStatus>,
    runtimes: HashMap<Namespace, Runtime>,
    /// entity -> node -> stake required by that node's roles/runtimes.
    stake_claims: HashMap<PublicKey, BTreeMap<PublicKey, u128>>,
    thresholds: StakeThresholds,
    debug_bypass_stake: bool,
    tee: Arc<dyn Tee>,

    entity_events: broadcast::Sender<EntityEvent>,
    node_events: broadcast::Sender<NodeEvent>,
    runtime_events: broadcast::Sender<RuntimeEvent>,
}

impl Registry {
    pub fn new(thresholds: StakeThresholds, debug_bypass_stake: bool) -> Self {
        Self::with_tee_verifier(thresholds, debug_bypass_stake, Arc::new(AcceptAllTee))
    }

    pub fn with_tee_verifier(thresholds: StakeThresholds, debug_bypass_stake: bool, tee: Arc<dyn Tee>) -> Self {
        let (entity_events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        let (node_events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        let (runtime_events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Registry {
            entities: HashMap::new(),
            nodes: HashMap::new(),
            node_status: HashMap::new(),
            runtimes: HashMap::new(),
            stake_claims: HashMap::new(),
            thresholds,
            debug_bypass_stake,
            tee,
            entity_events,
            node_events,
            runtime_events,
        }
    }

    // ---- entities ----------------------------------------------------

    pub fn register_entity(&mut self, signed: &Signed<Entity>) -> Result<(), RegistryError> {
        let entity = signed
            .open(ENTITY_SIGNATURE_CONTEXT)
            .map_err(|_| RegistryError::InvalidSignature)?;
        if entity.id != signed.signer() {
            return Err(RegistryError::InvalidArgument(
                "entity id must match the signing key".into(),
            ));
        }
        self.entities.insert(entity.id, entity.clone());
        let _ = self.entity_events.send(EntityEvent {
            entity,
            registration: true,
        });
        Ok(())
    }

    /// Deregisters an entity and cascades removal to every node it owns
    /// (spec.md §3 Entity invariants, §4.2 `deregister_entity`), releasing
    /// each removed node's stake claim and emitting the entity's removal
    /// event followed by one node removal event per cascaded node.
    pub fn deregister_entity(&mut self, entity_id: &PublicKey) -> Result<(), RegistryError> {
        let entity = self
            .entities
            .remove(entity_id)
            .ok_or(RegistryError::NoSuchEntity)?;
        let _ = self.entity_events.send(EntityEvent {
            entity,
            registration: false,
        });

        let owned_nodes: Vec<PublicKey> = self
            .nodes
            .values()
            .filter(|n| &n.entity_id == entity_id)
            .map(|n| n.id)
            .collect();
        for node_id in owned_nodes {
            if let Some(node) = self.remove_node(&node_id) {
                let _ = self.node_events.send(NodeEvent {
                    node,
                    registration: false,
                });
            }
        }
        Ok(())
    }

    /// Removes a node's descriptor, status and stake claim in one step.
    /// Callers are responsible for emitting the resulting `NodeEvent`.
    fn remove_node(&mut self, node_id: &PublicKey) -> Option<Node> {
        let node = self.nodes.remove(node_id)?;
        if let Some(claims) = self.stake_claims.get_mut(&node.entity_id) {
            claims.remove(node_id);
        }
        self.node_status.remove(node_id);
        Some(node)
    }

    pub fn get_entity(&self, id: &PublicKey) -> Option<Entity> {
        self.entities.get(id).cloned()
    }

    pub fn get_entities(&self) -> Vec<Entity> {
        self.entities.values().cloned().collect()
    }

    pub fn watch_entities(&self) -> broadcast::Receiver<EntityEvent> {
        self.entity_events.subscribe()
    }

    // ---- nodes ---------------------------------------------------------

    /// Registers or re-registers a node. `multi_signed` must carry a
    /// signature from the node's own identity key plus, unless the owning
    /// entity has `allow_entity_signed_nodes` set, a signature from the
    /// entity itself.
    pub fn register_node(
        &mut self,
        multi_signed: &MultiSigned<Node>,
        ledger: &Ledger,
        current_epoch: EpochTime,
    ) -> Result<(), RegistryError> {
        let (node, signers) = multi_signed
            .open(NODE_SIGNATURE_CONTEXT)
            .map_err(|_| RegistryError::InvalidSignature)?;

        let entity = self
            .entities
            .get(&node.entity_id)
            .cloned()
            .ok_or(RegistryError::NoSuchEntity)?;

        if !signers.contains(&node.id) {
            return Err(RegistryError::InvalidSignature);
        }
        if !entity.allow_entity_signed_nodes && !signers.contains(&entity.id) {
            return Err(RegistryError::MissingEntitySignature);
        }

        if node.roles.has_reserved_bits() {
            return Err(RegistryError::InvalidRoles);
        }
        if node.roles.requires_committee_address() && node.committee.addresses.is_empty() {
            return Err(RegistryError::MissingCommitteeAddress);
        }
        for node_runtime in &node.runtimes {
            let runtime = self
                .runtimes
                .get(&node_runtime.id)
                .ok_or(RegistryError::UnknownRuntime(node_runtime.id))?;
            if let Some(tee) = &node_runtime.capabilities.tee {
                if !self.tee.verify(tee, current_epoch) {
                    return Err(RegistryError::TeeVerificationFailed(node_runtime.id));
                }
            }
            if !admitted(&runtime.admission_policy, &node.entity_id) {
                return Err(RegistryError::AdmissionDenied(node_runtime.id));
            }
        }

        if let Some(status) = self.node_status.get(&node.id) {
            if status.frozen_until != oasis_core_common::EPOCH_INVALID && current_epoch < status.frozen_until {
                return Err(RegistryError::NodeFrozen(status.frozen_until));
            }
        }

        if let Some(existing) = self.nodes.get(&node.id) {
            let existing_runtimes: HashSet<Namespace> = existing.runtimes.iter().map(|r| r.id).collect();
            let new_runtimes: HashSet<Namespace> = node.runtimes.iter().map(|r| r.id).collect();
            if existing_runtimes != new_runtimes {
                return Err(RegistryError::RuntimeSetImmutable);
            }
        }

        let required = self.required_stake(&node);
        if !self.debug_bypass_stake {
            let available = ledger.escrow_active_balance(&entity.id).as_u128();
            let entity_claims = self.stake_claims.entry(entity.id).or_default();
            let existing_claim = entity_claims.get(&node.id).copied().unwrap_or(0);
            let total_needed: u128 = entity_claims.values().sum::<u128>() - existing_claim + required;
            if total_needed > available {
                return Err(RegistryError::InsufficientStake {
                    needed: total_needed,
                    available,
                });
            }
        }
        self.stake_claims
            .entry(entity.id)
            .or_default()
            .insert(node.id, required);

        self.nodes.insert(node.id, node.clone());
        self.node_status.entry(node.id).or_default();
        let _ = self.node_events.send(NodeEvent {
            node,
            registration: true,
        });
        Ok(())
    }

    fn required_stake(&self, node: &Node) -> u128 {
        let mut total = 0u128;
        for (role_bit, amount) in &self.thresholds.per_role {
            if node.roles.0 & role_bit != 0 {
                total += amount;
            }
        }
        total
    }

    /// Clears a node's freeze. Only the node's owning entity may call
    /// this (spec.md §4.2 `unfreeze_node`).
    pub fn unfreeze_node(&mut self, caller: &PublicKey, node_id: &PublicKey) -> Result<(), RegistryError> {
        let node = self.nodes.get(node_id).ok_or(RegistryError::NoSuchNode)?;
        if &node.entity_id != caller {
            return Err(RegistryError::NotNodeOwner);
        }
        let status = self.node_status.entry(*node_id).or_default();
        status.frozen_until = oasis_core_common::EPOCH_INVALID;
        Ok(())
    }

    /// Freezes a node until `until`, excluding it from scheduler
    /// eligibility until then. Exposed for the consensus app's
    /// discrepancy-slashing path; not itself part of the client RPC
    /// surface.
    pub fn freeze_node(&mut self, node_id: &PublicKey, until: EpochTime) -> Result<(), RegistryError> {
        if !self.nodes.contains_key(node_id) {
            return Err(RegistryError::NoSuchNode);
        }
        self.node_status.entry(*node_id).or_default().frozen_until = until;
        Ok(())
    }

    pub fn get_node(&self, id: &PublicKey) -> Option<Node> {
        self.nodes.get(id).cloned()
    }

    pub fn get_nodes(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    pub fn is_node_eligible(&self, id: &PublicKey, current_epoch: EpochTime) -> bool {
        match self.node_status.get(id) {
            Some(status) => {
                status.frozen_until == oasis_core_common::EPOCH_INVALID || current_epoch >= status.frozen_until
            }
            None => true,
        }
    }

    pub fn watch_nodes(&self) -> broadcast::Receiver<NodeEvent> {
        self.node_events.subscribe()
    }

    /// Two-phase expiration sweep (spec.md §4.2). A node past its
    /// `expiration` is first marked `expiration_processed` and its id
    /// returned for the caller's `expired_nodes` consensus event, but kept
    /// registered — and so still slashable — until `expiration +
    /// debonding_interval < current_epoch`, at which point it is actually
    /// removed and its stake claim released.
    pub fn expire_nodes(&mut self, current_epoch: EpochTime, debonding_interval: EpochTime) -> Vec<PublicKey> {
        let mut newly_expired = Vec::new();
        for node in self.nodes.values() {
            if node.expiration < current_epoch {
                let status = self.node_status.entry(node.id).or_default();
                if !status.expiration_processed {
                    status.expiration_processed = true;
                    newly_expired.push(node.id);
                }
            }
        }

        let debonded: Vec<PublicKey> = self
            .nodes
            .values()
            .filter(|n| {
                n.expiration
                    .checked_add(debonding_interval)
                    .map(|release_epoch| release_epoch < current_epoch)
                    .unwrap_or(false)
            })
            .map(|n| n.id)
            .collect();
        for node_id in debonded {
            if let Some(node) = self.remove_node(&node_id) {
                let _ = self.node_events.send(NodeEvent {
                    node,
                    registration: false,
                });
            }
        }

        newly_expired
    }

    // ---- runtimes --------------------------------------------------------

    pub fn register_runtime(&mut self, signed: &Signed<Runtime>) -> Result<(), RegistryError> {
        let runtime = signed
            .open(RUNTIME_SIGNATURE_CONTEXT)
            .map_err(|_| RegistryError::InvalidSignature)?;
        if !self.entities.contains_key(&runtime.entity_id) {
            return Err(RegistryError::NoSuchEntity);
        }
        if self.runtimes.contains_key(&runtime.id) {
            return Err(RegistryError::RuntimeAlreadyRegistered);
        }
        self.runtimes.insert(runtime.id, runtime.clone());
        let _ = self.runtime_events.send(RuntimeEvent { runtime });
        Ok(())
    }

    pub fn get_runtime(&self, id: &Namespace) -> Option<Runtime> {
        self.runtimes.get(id).cloned()
    }

    pub fn get_runtimes(&self) -> Vec<Runtime> {
        self.runtimes.values().cloned().collect()
    }

    pub fn watch_runtimes(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.runtime_events.subscribe()
    }
}

fn admitted(policy: &AdmissionPolicy, entity_id: &PublicKey) -> bool {
    match policy {
        AdmissionPolicy::AnyNode => true,
        AdmissionPolicy::EntityWhitelist { entities } => entities.contains(entity_id),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use oasis_core_common::{MemorySigner, Signer};
    use oasis_core_ledger::{Account, EscrowAccount, GeneralAccount, Ledger};

    use crate::types::{
        Address, Capabilities, CommitteeEndpoint, CommitteeParameters, RolesMask, RuntimeGenesis, RuntimeKind,
        StorageParameters, TEEHardware, TransportEndpoint, TxnSchedulerParameters,
    };

    fn entity_signer(seed: u8) -> MemorySigner {
        MemorySigner::from_seed(&[seed; 32])
    }

    fn make_runtime(id: Namespace, entity_id: PublicKey) -> Runtime {
        Runtime {
            id,
            entity_id,
            kind: RuntimeKind::Compute,
            tee_hardware: TEEHardware::Invalid,
            version: 1,
            key_manager: None,
            genesis: RuntimeGenesis {
                state_root: oasis_core_common::crypto::Hash::empty_hash(),
                round: 0,
                state_present: false,
                storage_receipts: vec![],
            },
            executor: CommitteeParameters {
                group_size: 1,
                group_backup_size: 0,
                allowed_stragglers: 0,
                round_timeout: 5,
            },
            merge: CommitteeParameters {
                group_size: 1,
                group_backup_size: 0,
                allowed_stragglers: 0,
                round_timeout: 5,
            },
            txn_scheduler: TxnSchedulerParameters {
                group_size: 1,
                algorithm: "batching".into(),
                batch_flush_timeout_ms: 1000,
                max_batch_size: 100,
                max_batch_size_bytes: 1 << 20,
            },
            storage: StorageParameters {
                group_size: 1,
                checkpoint_interval: 100,
                checkpoint_num_kept: 2,
                checkpoint_chunk_size: 1 << 16,
            },
            admission_policy: crate::types::AdmissionPolicy::AnyNode,
        }
    }

    fn make_node(id: PublicKey, entity_id: PublicKey, runtime_id: Namespace, expiration: EpochTime) -> Node {
        Node {
            id,
            entity_id,
            expiration,
            roles: RolesMask::COMPUTE,
            runtimes: vec![crate::types::NodeRuntime {
                id: runtime_id,
                capabilities: Capabilities::default(),
            }],
            p2p: TransportEndpoint {
                id,
                addresses: vec![],
            },
            consensus: TransportEndpoint {
                id,
                addresses: vec![],
            },
            committee: CommitteeEndpoint {
                addresses: vec![Address {
                    host: "127.0.0.1".into(),
                    port: 9000,
                }],
                certificate: vec![],
            },
        }
    }

    #[test]
    fn test_register_entity_and_runtime_and_node() {
        let mut registry = Registry::new(StakeThresholds::default(), true);
        let entity_signer = entity_signer(1);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        let signed_entity = Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity);
        registry.register_entity(&signed_entity).unwrap();
        assert_eq!(registry.get_entities().len(), 1);

        let runtime_id = Namespace::from_bytes([9u8; 32]);
        let runtime = make_runtime(runtime_id, entity.id);
        let signed_runtime = Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime);
        registry.register_runtime(&signed_runtime).unwrap();
        assert!(registry.get_runtime(&runtime_id).is_some());

        let node_signer = entity_signer; // entity co-signs via allow_entity_signed_nodes
        let node = make_node(node_signer.public_key(), entity.id, runtime_id, 100);
        let multi_signed = MultiSigned::sign(&[&node_signer], NODE_SIGNATURE_CONTEXT, &node);
        let ledger = Ledger::new();
        registry.register_node(&multi_signed, &ledger, 1).unwrap();
        assert!(registry.get_node(&node.id).is_some());
    }

    #[test]
    fn test_register_node_requires_entity_signature() {
        let mut registry = Registry::new(StakeThresholds::default(), true);
        let entity_signer = entity_signer(2);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: false,
        };
        let signed_entity = Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity);
        registry.register_entity(&signed_entity).unwrap();

        let runtime_id = Namespace::from_bytes([3u8; 32]);
        let runtime = make_runtime(runtime_id, entity.id);
        let signed_runtime = Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime);
        registry.register_runtime(&signed_runtime).unwrap();

        let node_signer = entity_signer(20);
        let node = make_node(node_signer.public_key(), entity.id, runtime_id, 100);
        let multi_signed = MultiSigned::sign(&[&node_signer], NODE_SIGNATURE_CONTEXT, &node);
        let ledger = Ledger::new();
        let err = registry.register_node(&multi_signed, &ledger, 1).unwrap_err();
        assert!(matches!(err, RegistryError::MissingEntitySignature));
    }

    #[test]
    fn test_insufficient_stake_rejected() {
        let mut thresholds = StakeThresholds::default();
        thresholds.per_role.insert(RolesMask::COMPUTE.0, 1000);
        let mut registry = Registry::new(thresholds, false);
        let entity_signer = entity_signer(4);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        registry
            .register_entity(&Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity))
            .unwrap();
        let runtime_id = Namespace::from_bytes([5u8; 32]);
        let runtime = make_runtime(runtime_id, entity.id);
        registry
            .register_runtime(&Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime))
            .unwrap();

        let node = make_node(entity_signer.public_key(), entity.id, runtime_id, 100);
        let multi_signed = MultiSigned::sign(&[&entity_signer], NODE_SIGNATURE_CONTEXT, &node);

        let mut ledger = Ledger::new();
        ledger.set_account(
            entity.id,
            Account {
                general: GeneralAccount {
                    balance: 0u128.into(),
                    nonce: 0,
                },
                escrow: EscrowAccount::default(),
            },
        );
        let err = registry.register_node(&multi_signed, &ledger, 1).unwrap_err();
        assert!(matches!(err, RegistryError::InsufficientStake { .. }));
    }

    #[test]
    fn test_expire_nodes_keeps_node_through_debonding_interval() {
        let mut registry = Registry::new(StakeThresholds::default(), true);
        let entity_signer = entity_signer(6);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        registry
            .register_entity(&Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity))
            .unwrap();
        let runtime_id = Namespace::from_bytes([7u8; 32]);
        let runtime = make_runtime(runtime_id, entity.id);
        registry
            .register_runtime(&Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime))
            .unwrap();
        let node = make_node(entity_signer.public_key(), entity.id, runtime_id, 5);
        let multi_signed = MultiSigned::sign(&[&entity_signer], NODE_SIGNATURE_CONTEXT, &node);
        registry.register_node(&multi_signed, &Ledger::new(), 1).unwrap();

        // Not yet expired.
        assert!(registry.expire_nodes(3, 10).is_empty());
        assert!(registry.get_node(&node.id).is_some());

        // Expired: marked processed and reported, but kept for slashing.
        let newly_expired = registry.expire_nodes(10, 10);
        assert_eq!(newly_expired, vec![node.id]);
        assert!(registry.get_node(&node.id).is_some());

        // A later sweep within the debonding window reports nothing new
        // and still keeps the node.
        assert!(registry.expire_nodes(12, 10).is_empty());
        assert!(registry.get_node(&node.id).is_some());

        // Once the debonding interval has elapsed, the node is removed.
        assert!(registry.expire_nodes(20, 10).is_empty());
        assert!(registry.get_node(&node.id).is_none());
    }

    #[test]
    fn test_deregister_entity_cascades_to_owned_nodes() {
        let mut registry = Registry::new(StakeThresholds::default(), true);
        let entity_signer = entity_signer(8);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        registry
            .register_entity(&Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity))
            .unwrap();
        let runtime_id = Namespace::from_bytes([10u8; 32]);
        let runtime = make_runtime(runtime_id, entity.id);
        registry
            .register_runtime(&Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime))
            .unwrap();
        let node = make_node(entity_signer.public_key(), entity.id, runtime_id, 100);
        let multi_signed = MultiSigned::sign(&[&entity_signer], NODE_SIGNATURE_CONTEXT, &node);
        registry.register_node(&multi_signed, &Ledger::new(), 1).unwrap();

        let mut node_events = registry.watch_nodes();
        let mut entity_events = registry.watch_entities();

        registry.deregister_entity(&entity.id).unwrap();

        assert!(registry.get_entity(&entity.id).is_none());
        assert!(registry.get_node(&node.id).is_none());
        assert!(!entity_events.try_recv().unwrap().registration);
        assert!(!node_events.try_recv().unwrap().registration);
    }

    #[test]
    fn test_register_node_rejects_tee_verification_failure() {
        let mut registry = Registry::with_tee_verifier(StakeThresholds::default(), true, Arc::new(crate::RejectAllTee));
        let entity_signer = entity_signer(11);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        registry
            .register_entity(&Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity))
            .unwrap();
        let runtime_id = Namespace::from_bytes([12u8; 32]);
        let runtime = make_runtime(runtime_id, entity.id);
        registry
            .register_runtime(&Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime))
            .unwrap();

        let mut node = make_node(entity_signer.public_key(), entity.id, runtime_id, 100);
        node.runtimes[0].capabilities.tee = Some(crate::types::CapabilityTEE {
            hardware: TEEHardware::IntelSGX,
            rak: entity_signer.public_key(),
            attestation: vec![1, 2, 3],
        });
        let multi_signed = MultiSigned::sign(&[&entity_signer], NODE_SIGNATURE_CONTEXT, &node);
        let err = registry
            .register_node(&multi_signed, &Ledger::new(), 1)
            .unwrap_err();
        assert!(matches!(err, RegistryError::TeeVerificationFailed(id) if id == runtime_id));
    }

    #[test]
    fn test_register_node_rejects_admission_denied() {
        let mut registry = Registry::new(StakeThresholds::default(), true);
        let entity_signer = entity_signer(13);
        let entity = Entity {
            id: entity_signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        registry
            .register_entity(&Signed::sign(&entity_signer, ENTITY_SIGNATURE_CONTEXT, &entity))
            .unwrap();
        let runtime_id = Namespace::from_bytes([14u8; 32]);
        let mut runtime = make_runtime(runtime_id, entity.id);
        runtime.admission_policy = crate::types::AdmissionPolicy::EntityWhitelist {
            entities: vec![entity_signer(99).public_key()],
        };
        registry
            .register_runtime(&Signed::sign(&entity_signer, RUNTIME_SIGNATURE_CONTEXT, &runtime))
            .unwrap();

        let node = make_node(entity_signer.public_key(), entity.id, runtime_id, 100);
        let multi_signed = MultiSigned::sign(&[&entity_signer], NODE_SIGNATURE_CONTEXT, &node);
        let err = registry
            .register_node(&multi_signed, &Ledger::new(), 1)
            .unwrap_err();
        assert!(matches!(err, RegistryError::AdmissionDenied(id) if id == runtime_id));
    }
}
