//! Deterministic committee election.
//!
//! Grounded on spec.md §4.3's PRF-keyed shuffle: the teacher's
//! `scheduler/base/src/lib.rs` only describes the old ekiden gRPC
//! interface (no implementation survives in this pack), so the election
//! algorithm itself is built fresh from the stated invariants, using the
//! `rand` crate the teacher already depends on for `common/src/bytes.rs`
//! random-id generation, keyed through a deterministic `StdRng` seed
//! rather than an OS-entropy source.
use oasis_core_common::{crypto::Hash, EpochTime, Namespace, PublicKey};
use rand::{seq::SliceRandom, SeedableRng};

use crate::{
    error::SchedulerError,
    types::{Committee, CommitteeKind, CommitteeMember, Role},
};

/// Elect a committee of kind `kind` for `runtime_id` at `epoch` from
/// `eligible` nodes and the epoch's entropy `beacon`.
///
/// Pure: byte-equal `eligible`/`beacon`/`runtime_id`/`kind`/`epoch` always
/// produce a byte-equal `Committee`, since `eligible` is sorted before the
/// keyed shuffle runs and the shuffle's seed is a hash of every other
/// input.
pub fn elect(
    eligible: &[PublicKey],
    beacon: &[u8],
    runtime_id: Namespace,
    kind: CommitteeKind,
    epoch: EpochTime,
    group_size: usize,
    group_backup_size: usize,
) -> Result<Committee, SchedulerError> {
    if eligible.len() < group_size {
        return Err(SchedulerError::NotEnoughNodes {
            needed: group_size,
            available: eligible.len(),
        });
    }

    let mut pool: Vec<PublicKey> = eligible.to_vec();
    pool.sort();

    let seed = shuffle_seed(beacon, runtime_id, kind, epoch);
    let mut rng = rand::rngs::StdRng::from_seed(seed);
    pool.shuffle(&mut rng);

    let backup_count = group_backup_size.min(pool.len() - group_size);
    let mut members = Vec::with_capacity(group_size + backup_count);
    for (i, public_key) in pool.iter().take(group_size).enumerate() {
        let role = if i == 0 && kind.requires_leader() {
            Role::Leader
        } else {
            Role::Worker
        };
        members.push(CommitteeMember {
            role,
            public_key: *public_key,
        });
    }
    for public_key in pool.iter().skip(group_size).take(backup_count) {
        members.push(CommitteeMember {
            role: Role::BackupWorker,
            public_key: *public_key,
        });
    }

    Ok(Committee {
        kind,
        runtime_id,
        members,
        valid_for: epoch,
    })
}

fn shuffle_seed(beacon: &[u8], runtime_id: Namespace, kind: CommitteeKind, epoch: EpochTime) -> [u8; 32] {
    let mut buf = Vec::with_capacity(beacon.len() + 32 + 1 + 8);
    buf.extend_from_slice(beacon);
    buf.extend_from_slice(runtime_id.as_bytes());
    buf.push(kind as u8);
    buf.extend_from_slice(&epoch.to_be_bytes());
    *Hash::digest_bytes(&buf).as_bytes()
}
