//! Per-runtime round state machine.
//!
//! Grounded on spec.md §4.4 (no implementation of this FSM survives in
//! the teacher's pack — `consensus/optimistic/src/lib.rs` is the old
//! ekiden BFT consensus driver, used here only for the general shape of
//! "insert commitment, attempt finalize, else wait"). Header/commitment
//! types come from [`crate::types`], grounded field-for-field on
//! `runtime/src/consensus/roothash.rs`.
use std::collections::{HashMap, HashSet};

use oasis_core_common::{crypto::Hash, PublicKey};
use oasis_core_scheduler::types::Committee;

use crate::{
    error::RoothashError,
    types::{
        Block, ComputeResultsHeader, ExecutionDiscrepancyDetected, Header, HeaderType, Message,
        OpenCommitment, RoundFailed,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    WaitingCommitments,
    DiscrepancyWaitingCommitments,
    Finalized,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundEvent {
    Finalized(Header),
    ExecutionDiscrepancyDetected(ExecutionDiscrepancyDetected),
    RoundFailed(RoundFailed),
}

/// Per-runtime round FSM. One instance tracks exactly one runtime's
/// in-flight round; the committee node loop (or, in a single-process
/// deployment, the consensus app driving roothash) owns one per runtime.
pub struct Round {
    pub current_block: Block,
    pub committee: Committee,
    pub commitments: HashMap<PublicKey, OpenCommitment>,
    pub state: RoundState,
    pub timed_out: bool,
}

impl Round {
    pub fn new(current_block: Block, committee: Committee) -> Self {
        Round {
            current_block,
            committee,
            commitments: HashMap::new(),
            state: RoundState::WaitingCommitments,
            timed_out: false,
        }
    }

    /// Re-initialise the round over a freshly elected committee, e.g. at
    /// an epoch transition. `tip` is carried over as the round's base
    /// block.
    pub fn refresh(&mut self, committee: Committee, tip: Block) {
        self.committee = committee;
        self.current_block = tip;
        self.commitments.clear();
        self.state = RoundState::WaitingCommitments;
        self.timed_out = false;
    }

    fn worker_ids(&self) -> HashSet<PublicKey> {
        self.committee.workers().map(|m| m.public_key).collect()
    }

    fn backup_ids(&self) -> HashSet<PublicKey> {
        self.committee.backup_workers().map(|m| m.public_key).collect()
    }

    /// Accept a commitment from `signer`, validating the preconditions
    /// for the round's current state, then attempt finalization.
    pub fn submit_commitment(
        &mut self,
        signer: PublicKey,
        commitment: OpenCommitment,
        now: u64,
    ) -> Result<Option<RoundEvent>, RoothashError> {
        match self.state {
            RoundState::Finalized => return Err(RoothashError::WrongState),
            RoundState::WaitingCommitments => {
                if !self.worker_ids().contains(&signer) {
                    return Err(RoothashError::NotCommitteeMember);
                }
            }
            RoundState::DiscrepancyWaitingCommitments => {
                if !self.backup_ids().contains(&signer) {
                    return Err(RoothashError::NotCommitteeMember);
                }
            }
        }
        if self.commitments.contains_key(&signer) {
            return Err(RoothashError::DuplicateCommitment);
        }
        if commitment.header.previous_hash != self.current_block.header.encoded_hash() {
            return Err(RoothashError::StaleCommitment);
        }
        self.commitments.insert(signer, commitment);

        Ok(match self.state {
            RoundState::WaitingCommitments => self.check_fast_path(now),
            RoundState::DiscrepancyWaitingCommitments => self.check_backup_majority(now),
            RoundState::Finalized => None,
        })
    }

    /// Called when the per-runtime round timer fires. Forces a
    /// finalization attempt with the straggler allowance (fast path) or
    /// the majority tally (backup path); falls sideways to
    /// `round_failed` when neither produces a result.
    pub fn force_timeout(&mut self, allowed_stragglers: usize, now: u64) -> Option<RoundEvent> {
        self.timed_out = true;
        match self.state {
            RoundState::WaitingCommitments => {
                if let Some(event) = self.check_fast_path_with_stragglers(allowed_stragglers, now) {
                    return Some(event);
                }
                let leader_committed = self
                    .committee
                    .leader()
                    .map_or(false, |leader| self.commitments.contains_key(&leader.public_key));
                if leader_committed {
                    Some(self.trigger_discrepancy())
                } else {
                    Some(self.fail_round())
                }
            }
            RoundState::DiscrepancyWaitingCommitments => {
                self.check_backup_majority(now).or_else(|| Some(self.fail_round()))
            }
            RoundState::Finalized => None,
        }
    }

    fn tally(&self, ids: &HashSet<PublicKey>) -> HashMap<Hash, usize> {
        let mut tally: HashMap<Hash, usize> = HashMap::new();
        for (signer, commitment) in &self.commitments {
            if ids.contains(signer) {
                *tally.entry(commitment.header.encoded_hash()).or_insert(0) += 1;
            }
        }
        tally
    }

    fn check_fast_path(&mut self, now: u64) -> Option<RoundEvent> {
        let workers = self.worker_ids();
        let tally = self.tally(&workers);
        if tally.len() > 1 {
            return Some(self.trigger_discrepancy());
        }
        let (hash, count) = tally.into_iter().next()?;
        if count == workers.len() {
            Some(self.finalize(hash, now))
        } else {
            None
        }
    }

    fn check_fast_path_with_stragglers(&mut self, allowed_stragglers: usize, now: u64) -> Option<RoundEvent> {
        let workers = self.worker_ids();
        let tally = self.tally(&workers);
        if tally.len() > 1 {
            return Some(self.trigger_discrepancy());
        }
        let required = workers.len().saturating_sub(allowed_stragglers).max(1);
        let (hash, count) = tally.into_iter().max_by_key(|(_, count)| *count)?;
        if count >= required {
            Some(self.finalize(hash, now))
        } else {
            None
        }
    }

    fn check_backup_majority(&mut self, now: u64) -> Option<RoundEvent> {
        let backups = self.backup_ids();
        let n = backups.len();
        if n == 0 {
            return None;
        }
        let tally = self.tally(&backups);
        let (hash, _) = tally.into_iter().find(|(_, count)| count * 2 > n)?;
        Some(self.finalize(hash, now))
    }

    fn trigger_discrepancy(&mut self) -> RoundEvent {
        self.state = RoundState::DiscrepancyWaitingCommitments;
        self.timed_out = false;
        let leader_input_hash = self
            .committee
            .leader()
            .and_then(|leader| self.commitments.get(&leader.public_key))
            .and_then(|commitment| commitment.header.input_hash)
            .unwrap_or_else(Hash::empty_hash);
        RoundEvent::ExecutionDiscrepancyDetected(ExecutionDiscrepancyDetected {
            input_hash: leader_input_hash,
            header: self.current_block.header.clone(),
        })
    }

    fn fail_round(&mut self) -> RoundEvent {
        let round = self.current_block.header.round + 1;
        let mut header = self.current_block.header.clone();
        header.round = round;
        header.header_type = HeaderType::RoundFailed;
        header.previous_hash = self.current_block.header.encoded_hash();
        self.current_block = Block { header: header.clone() };
        self.state = RoundState::Finalized;
        RoundEvent::RoundFailed(RoundFailed { round, header })
    }

    /// Build the finalized header for the winning `ComputeResultsHeader`
    /// hash, advance the tip, and absorb into `Finalized` (a subsequent
    /// `refresh` starts the next round).
    fn finalize(&mut self, winning_hash: Hash, now: u64) -> RoundEvent {
        let winning = self
            .commitments
            .values()
            .find(|c| c.header.encoded_hash() == winning_hash)
            .expect("winning hash came from this round's own commitments")
            .header
            .clone();

        let header = Header {
            version: self.current_block.header.version,
            namespace: self.current_block.header.namespace,
            round: winning.round,
            timestamp: now,
            header_type: HeaderType::Normal,
            previous_hash: self.current_block.header.encoded_hash(),
            io_root: winning.io_root(),
            input_hash: winning.input_hash.unwrap_or_else(Hash::empty_hash),
            output_hash: winning.output_hash.unwrap_or_else(Hash::empty_hash),
            state_root: winning.state_root.unwrap_or_else(Hash::empty_hash),
            messages_hash: winning.messages_hash.unwrap_or_else(Hash::empty_hash),
            storage_signatures: None,
        };
        self.current_block = Block { header: header.clone() };
        self.state = RoundState::Finalized;
        RoundEvent::Finalized(header)
    }

    /// Computed but unused by any commitment yet; exposed for callers
    /// that want to pre-compute the messages a batch emits before it is
    /// committed.
    pub fn messages_hash(messages: &[Message]) -> Hash {
        Message::messages_hash(messages)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use oasis_core_common::{crypto::Hash, PublicKey, SignatureBundle, Signature};
    use oasis_core_scheduler::types::{CommitteeKind, CommitteeMember, Role};

    fn key(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 32])
    }

    fn committee(workers: &[u8], leader_idx: Option<usize>, backups: &[u8]) -> Committee {
        let mut members: Vec<CommitteeMember> = workers
            .iter()
            .enumerate()
            .map(|(i, b)| CommitteeMember {
                role: if Some(i) == leader_idx { Role::Leader } else { Role::Worker },
                public_key: key(*b),
            })
            .collect();
        members.extend(backups.iter().map(|b| CommitteeMember {
            role: Role::BackupWorker,
            public_key: key(*b),
        }));
        Committee {
            kind: CommitteeKind::Executor,
            runtime_id: oasis_core_common::Namespace::from_bytes([0u8; 32]),
            members,
            valid_for: 1,
        }
    }

    fn commit(previous_hash: Hash, round: u64, state_byte: u8) -> OpenCommitment {
        OpenCommitment {
            header: ComputeResultsHeader {
                round,
                previous_hash,
                input_hash: Some(Hash::digest_bytes(b"in")),
                output_hash: Some(Hash::digest_bytes(b"out")),
                state_root: Some(Hash::digest_bytes(&[state_byte])),
                messages_hash: Some(Hash::empty_hash()),
            },
            signature: SignatureBundle {
                public_key: key(0),
                signature: Signature::from_bytes([0u8; 64]),
            },
        }
    }

    #[test]
    fn test_fast_finalization_on_full_agreement() {
        let genesis = Block::default();
        let tip_hash = genesis.header.encoded_hash();
        let committee = committee(&[1, 2, 3], Some(0), &[4]);
        let mut round = Round::new(genesis, committee);

        let c = commit(tip_hash, 1, 7);
        assert!(round.submit_commitment(key(1), c.clone(), 100).unwrap().is_none());
        assert!(round.submit_commitment(key(2), c.clone(), 100).unwrap().is_none());
        let event = round.submit_commitment(key(3), c, 100).unwrap().unwrap();
        match event {
            RoundEvent::Finalized(header) => assert_eq!(header.round, 1),
            other => panic!("expected finalization, got {:?}", other),
        }
        assert_eq!(round.state, RoundState::Finalized);
    }

    #[test]
    fn test_discrepancy_on_disagreement() {
        let genesis = Block::default();
        let tip_hash = genesis.header.encoded_hash();
        let committee = committee(&[1, 2, 3], Some(0), &[4]);
        let mut round = Round::new(genesis, committee);

        round.submit_commitment(key(1), commit(tip_hash, 1, 1), 100).unwrap();
        let event = round
            .submit_commitment(key(2), commit(tip_hash, 1, 2), 100)
            .unwrap()
            .unwrap();
        assert!(matches!(event, RoundEvent::ExecutionDiscrepancyDetected(_)));
        assert_eq!(round.state, RoundState::DiscrepancyWaitingCommitments);
    }

    #[test]
    fn test_backup_majority_finalizes() {
        let genesis = Block::default();
        let tip_hash = genesis.header.encoded_hash();
        let committee = committee(&[1, 2], Some(0), &[4, 5, 6]);
        let mut round = Round::new(genesis, committee);
        round.state = RoundState::DiscrepancyWaitingCommitments;

        round.submit_commitment(key(4), commit(tip_hash, 1, 9), 100).unwrap();
        let event = round
            .submit_commitment(key(5), commit(tip_hash, 1, 9), 100)
            .unwrap()
            .unwrap();
        assert!(matches!(event, RoundEvent::Finalized(_)));
    }

    #[test]
    fn test_timeout_without_leader_commitment_fails_round() {
        let genesis = Block::default();
        let committee = committee(&[1, 2, 3], Some(0), &[4]);
        let mut round = Round::new(genesis, committee);
        let event = round.force_timeout(0, 100).unwrap();
        assert!(matches!(event, RoundEvent::RoundFailed(_)));
    }

    #[test]
    fn test_straggler_allowance_finalizes_on_timeout() {
        let genesis = Block::default();
        let tip_hash = genesis.header.encoded_hash();
        let committee = committee(&[1, 2, 3], Some(0), &[4]);
        let mut round = Round::new(genesis, committee);
        round.submit_commitment(key(1), commit(tip_hash, 1, 1), 100).unwrap();
        round.submit_commitment(key(2), commit(tip_hash, 1, 1), 100).unwrap();
        let event = round.force_timeout(1, 200).unwrap();
        assert!(matches!(event, RoundEvent::Finalized(_)));
    }
}
