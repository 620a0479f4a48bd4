use oasis_core_common::{EpochTime, Namespace, PublicKey};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum CommitteeKind {
    Executor = 0,
    Storage = 1,
    TxnScheduler = 2,
    Merge = 3,
    Validator = 4,
}

impl CommitteeKind {
    /// Kinds whose first elected worker is additionally the leader.
    pub fn requires_leader(&self) -> bool {
        matches!(self, CommitteeKind::Executor | CommitteeKind::TxnScheduler | CommitteeKind::Merge)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Role {
    Worker = 0,
    BackupWorker = 1,
    Leader = 2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub role: Role,
    pub public_key: PublicKey,
}

/// An epoch-scoped set of elected nodes for one kind of one runtime.
/// `runtime_id` is the all-zero namespace for the base validator set,
/// which is not tied to any particular runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    pub kind: CommitteeKind,
    pub runtime_id: Namespace,
    pub members: Vec<CommitteeMember>,
    pub valid_for: EpochTime,
}

impl Committee {
    pub fn leader(&self) -> Option<&CommitteeMember> {
        self.members.iter().find(|m| matches!(m.role, Role::Leader))
    }

    pub fn workers(&self) -> impl Iterator<Item = &CommitteeMember> {
        self.members
            .iter()
            .filter(|m| matches!(m.role, Role::Worker | Role::Leader))
    }

    pub fn backup_workers(&self) -> impl Iterator<Item = &CommitteeMember> {
        self.members.iter().filter(|m| matches!(m.role, Role::BackupWorker))
    }
}
