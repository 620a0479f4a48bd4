//! Entity, node and runtime descriptors.
//!
//! Field layout follows the teacher's `common/src/node.rs` (`Node`,
//! `Runtime`, `Capabilities`, `CapabilityTEE`, `TEEHardware`) generalized
//! from the old protobuf-era `B256`/`H160` fields to the shared
//! `oasis-core-common` identifier types, plus the committee/admission
//! fields spec.md §3 adds on top.
use std::collections::BTreeMap;

use oasis_core_common::{EpochTime, Namespace, PublicKey, Signed};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Bitmask of node roles. Only the low 7 bits are defined; any other bit
/// set must be rejected by `register_node` (spec.md §3 Node invariants).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesMask(pub u32);

impl RolesMask {
    pub const COMPUTE: RolesMask = RolesMask(1 << 0);
    pub const STORAGE: RolesMask = RolesMask(1 << 1);
    pub const KEY_MANAGER: RolesMask = RolesMask(1 << 2);
    pub const VALIDATOR: RolesMask = RolesMask(1 << 3);
    pub const TRANSACTION_SCHEDULER: RolesMask = RolesMask(1 << 4);
    pub const MERGE: RolesMask = RolesMask(1 << 5);
    pub const BACKUP: RolesMask = RolesMask(1 << 6);
    const DEFINED: u32 = Self::COMPUTE.0
        | Self::STORAGE.0
        | Self::KEY_MANAGER.0
        | Self::VALIDATOR.0
        | Self::TRANSACTION_SCHEDULER.0
        | Self::MERGE.0
        | Self::BACKUP.0;

    pub fn contains(&self, other: RolesMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn has_reserved_bits(&self) -> bool {
        self.0 & !Self::DEFINED != 0
    }

    pub fn union(self, other: RolesMask) -> RolesMask {
        RolesMask(self.0 | other.0)
    }

    /// Roles whose registration requires a reachable network address and a
    /// committee TLS certificate (spec.md §3 Node invariants).
    pub fn requires_committee_address(&self) -> bool {
        self.contains(Self::COMPUTE)
            || self.contains(Self::STORAGE)
            || self.contains(Self::KEY_MANAGER)
            || self.contains(Self::TRANSACTION_SCHEDULER)
            || self.contains(Self::MERGE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TEEHardware {
    Invalid = 0,
    IntelSGX = 1,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityTEE {
    pub hardware: TEEHardware,
    pub rak: PublicKey,
    pub attestation: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub tee: Option<CapabilityTEE>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRuntime {
    pub id: Namespace,
    pub capabilities: Capabilities,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportEndpoint {
    pub id: PublicKey,
    pub addresses: Vec<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeEndpoint {
    pub addresses: Vec<Address>,
    pub certificate: Vec<u8>,
}

/// A registered network participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: PublicKey,
    pub entity_id: PublicKey,
    pub expiration: EpochTime,
    pub roles: RolesMask,
    pub runtimes: Vec<NodeRuntime>,
    pub p2p: TransportEndpoint,
    pub consensus: TransportEndpoint,
    pub committee: CommitteeEndpoint,
}

/// An entity's off-chain identity, the owner of nodes and runtimes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: PublicKey,
    pub allow_entity_signed_nodes: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RuntimeKind {
    Compute = 0,
    KeyManager = 1,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeGenesis {
    pub state_root: oasis_core_common::crypto::Hash,
    pub round: u64,
    pub state_present: bool,
    pub storage_receipts: Vec<oasis_core_common::SignatureBundle>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeParameters {
    pub group_size: u16,
    pub group_backup_size: u16,
    pub allowed_stragglers: u16,
    pub round_timeout: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnSchedulerParameters {
    pub group_size: u16,
    pub algorithm: String,
    pub batch_flush_timeout_ms: u64,
    pub max_batch_size: u64,
    pub max_batch_size_bytes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageParameters {
    pub group_size: u16,
    pub checkpoint_interval: u64,
    pub checkpoint_num_kept: u64,
    pub checkpoint_chunk_size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionPolicy {
    AnyNode,
    EntityWhitelist { entities: Vec<PublicKey> },
}

/// A runtime's immutable descriptor (spec.md §3 Runtime descriptor).
/// Immutable after registration in this spec; re-registration (outside
/// this module's current scope) may only update fields the owning entity
/// is permitted to modify.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub id: Namespace,
    pub entity_id: PublicKey,
    pub kind: RuntimeKind,
    pub tee_hardware: TEEHardware,
    pub version: u64,
    pub key_manager: Option<Namespace>,
    pub genesis: RuntimeGenesis,
    pub executor: CommitteeParameters,
    pub merge: CommitteeParameters,
    pub txn_scheduler: TxnSchedulerParameters,
    pub storage: StorageParameters,
    pub admission_policy: AdmissionPolicy,
}

/// Per-node bookkeeping not part of the signed descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub expiration_processed: bool,
    pub frozen_until: EpochTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
    pub entity: Entity,
    pub registration: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub node: Node,
    pub registration: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    pub runtime: Runtime,
}

/// Envelope wire types (§6 method table).
pub type SignedEntity = Signed<Entity>;
pub type SignedRuntime = Signed<Runtime>;
pub type MultiSignedNode = oasis_core_common::MultiSigned<Node>;

/// Thresholds a node's registration claims against its owner's escrow.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StakeClaim {
    pub node_id: PublicKey,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StakeThresholds {
    pub per_role: BTreeMap<u32, u128>,
}
