//! Resolve a node's role(s) within a freshly elected committee snapshot.
//!
//! Grounded on spec.md §4.6's "maintain current committee membership and
//! role" and `oasis-core-scheduler`'s `Committee`/`Role`/`CommitteeKind`.
use oasis_core_common::{Namespace, PublicKey};
use oasis_core_scheduler::{
    types::{Committee, CommitteeKind, Role},
    CommitteeSnapshot,
};

/// This node's membership in one committee, or `None` if it isn't a
/// member at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    Leader,
    Worker,
    BackupWorker,
}

impl NodeRole {
    fn from_role(role: Role) -> NodeRole {
        match role {
            Role::Leader => NodeRole::Leader,
            Role::Worker => NodeRole::Worker,
            Role::BackupWorker => NodeRole::BackupWorker,
        }
    }
}

/// Every committee (by kind) `node_id` belongs to for `runtime_id`,
/// within `snapshot`.
pub fn memberships(snapshot: &CommitteeSnapshot, runtime_id: Namespace, node_id: &PublicKey) -> Vec<(CommitteeKind, NodeRole)> {
    snapshot
        .iter()
        .filter(|((rt, _), _)| *rt == runtime_id)
        .filter_map(|((_, kind), committee)| membership(committee, node_id).map(|role| (*kind, role)))
        .collect()
}

fn membership(committee: &Committee, node_id: &PublicKey) -> Option<NodeRole> {
    committee
        .members
        .iter()
        .find(|m| m.public_key == *node_id)
        .map(|m| NodeRole::from_role(m.role))
}

#[cfg(test)]
mod test {
    use super::*;
    use oasis_core_scheduler::types::CommitteeMember;
    use std::collections::BTreeMap;

    fn key(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_memberships_reports_role_and_kind() {
        let runtime_id = Namespace::from_bytes([9u8; 32]);
        let mut snapshot: CommitteeSnapshot = BTreeMap::new();
        snapshot.insert(
            (runtime_id, CommitteeKind::Executor),
            Committee {
                kind: CommitteeKind::Executor,
                runtime_id,
                members: vec![
                    CommitteeMember { role: Role::Leader, public_key: key(1) },
                    CommitteeMember { role: Role::Worker, public_key: key(2) },
                ],
                valid_for: 1,
            },
        );

        let found = memberships(&snapshot, runtime_id, &key(1));
        assert_eq!(found, vec![(CommitteeKind::Executor, NodeRole::Leader)]);
        assert!(memberships(&snapshot, runtime_id, &key(3)).is_empty());
    }
}
