//! Per-epoch committee election driven off a registry snapshot.
use std::collections::BTreeMap;

use oasis_core_common::{broker::Broker, EpochTime, Namespace};
use oasis_core_registry::{
    types::{AdmissionPolicy, RolesMask},
    Registry,
};

use crate::{
    election,
    types::{Committee, CommitteeKind},
};

/// All committees elected for a single epoch, keyed by `(runtime_id, kind)`.
/// `Namespace::from_bytes([0; 32])` is reserved for the base validator set.
pub type CommitteeSnapshot = BTreeMap<(Namespace, CommitteeKind), Committee>;

const VALIDATOR_NAMESPACE: Namespace = Namespace::from_bytes([0u8; 32]);

pub struct Scheduler {
    broker: Broker<CommitteeSnapshot>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            broker: Broker::new(16),
        }
    }

    /// Elect committees for every registered runtime and the base
    /// validator set, and publish the result. Skips (rather than fails)
    /// individual runtime/kind combinations with too few eligible nodes,
    /// so one under-provisioned runtime cannot block every other
    /// runtime's election.
    pub fn elect_epoch(
        &self,
        registry: &Registry,
        beacon: &[u8],
        epoch: EpochTime,
        validator_group_size: usize,
    ) -> CommitteeSnapshot {
        let mut snapshot = CommitteeSnapshot::new();

        let validators: Vec<_> = registry
            .get_nodes()
            .into_iter()
            .filter(|n| n.roles.contains(RolesMask::VALIDATOR) && registry.is_node_eligible(&n.id, epoch))
            .filter(|n| n.expiration >= epoch)
            .map(|n| n.id)
            .collect();
        if let Ok(committee) = election::elect(
            &validators,
            beacon,
            VALIDATOR_NAMESPACE,
            CommitteeKind::Validator,
            epoch,
            validator_group_size,
            0,
        ) {
            snapshot.insert((VALIDATOR_NAMESPACE, CommitteeKind::Validator), committee);
        }

        for runtime in registry.get_runtimes() {
            let kinds = [
                (CommitteeKind::Executor, RolesMask::COMPUTE, runtime.executor.group_size, runtime.executor.group_backup_size),
                (CommitteeKind::Merge, RolesMask::MERGE, runtime.merge.group_size, runtime.merge.group_backup_size),
                (CommitteeKind::Storage, RolesMask::STORAGE, runtime.storage.group_size, 0),
                (CommitteeKind::TxnScheduler, RolesMask::TRANSACTION_SCHEDULER, runtime.txn_scheduler.group_size, 0),
            ];
            for (kind, role, group_size, group_backup_size) in kinds {
                let eligible: Vec<_> = registry
                    .get_nodes()
                    .into_iter()
                    .filter(|n| n.roles.contains(role))
                    .filter(|n| registry.is_node_eligible(&n.id, epoch))
                    .filter(|n| n.expiration >= epoch)
                    .filter(|n| n.runtimes.iter().any(|r| r.id == runtime.id))
                    .filter(|n| admitted(&runtime.admission_policy, &n.entity_id))
                    .map(|n| n.id)
                    .collect();
                if let Ok(committee) = election::elect(
                    &eligible,
                    beacon,
                    runtime.id,
                    kind,
                    epoch,
                    group_size as usize,
                    group_backup_size as usize,
                ) {
                    snapshot.insert((runtime.id, kind), committee);
                }
            }
        }

        self.broker.publish(snapshot.clone());
        snapshot
    }

    pub fn watch_committees(&self) -> oasis_core_common::broker::BrokerStream<CommitteeSnapshot> {
        self.broker.subscribe()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn admitted(policy: &AdmissionPolicy, entity_id: &oasis_core_common::PublicKey) -> bool {
    match policy {
        AdmissionPolicy::AnyNode => true,
        AdmissionPolicy::EntityWhitelist { entities } => entities.contains(entity_id),
    }
}
