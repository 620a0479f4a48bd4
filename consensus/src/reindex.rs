//! Reindex-on-startup: after a restart, walk committed block results the
//! local index is missing and replay every `finalized` roothash event so
//! the index's `(round → block)` mapping matches consensus history exactly
//! up to the point the index was last durably flushed.
//!
//! Grounded on the Design Notes' "Retry loops with unbounded exponential
//! backoff ... block history reindex" mapping and spec.md's testable
//! property 9 ("Monotonic restart"): a history-commit failure here is
//! fatal (the index cannot be trusted afterwards), while a height mismatch
//! on an individual event is skipped with a warning rather than aborting
//! the whole reindex.
use oasis_core_common::{cbor, Namespace};
use slog::{warn, Logger};

use crate::{
    adapter::Consensus,
    error::ConsensusError,
    types::{ValueFinalized, EVENT_KIND_FINALIZED},
};

pub const ROOTHASH_APP_NAME: &str = "roothash";

/// Replays every `roothash.finalized` event between `last_indexed_height +
/// 1` and the consensus tip (inclusive), calling `commit` for each in
/// height order. Returns the new last-indexed height.
///
/// `commit` must be infallible from this function's point of view: a
/// history-commit failure means the index is no longer trustworthy, so it
/// panics rather than returning a partially-applied reindex.
pub async fn reindex<C, F>(
    consensus: &C,
    last_indexed_height: i64,
    logger: &Logger,
    mut commit: F,
) -> Result<i64, ConsensusError>
where
    C: Consensus + ?Sized,
    F: FnMut(Namespace, u64),
{
    let tip = consensus.latest_height();
    let mut indexed = last_indexed_height;

    for height in (last_indexed_height + 1)..=tip {
        let results = match consensus.get_block_results(height).await {
            Ok(results) => results,
            Err(ConsensusError::NoSuchBlock) => {
                warn!(logger, "reindex: missing block results, skipping"; "height" => height);
                continue;
            }
            Err(err) => return Err(err),
        };

        if results.height != height {
            warn!(
                logger,
                "reindex: block results height mismatch, skipping";
                "expected" => height,
                "got" => results.height,
            );
            continue;
        }

        for event in results.events {
            if event.app != ROOTHASH_APP_NAME || event.kind != EVENT_KIND_FINALIZED {
                continue;
            }
            let finalized: ValueFinalized = match cbor::from_slice(&event.value) {
                Ok(value) => value,
                Err(err) => {
                    warn!(logger, "reindex: malformed finalized event, skipping"; "height" => height, "err" => %err);
                    continue;
                }
            };
            commit(finalized.id, finalized.round);
        }

        indexed = height;
    }

    Ok(indexed)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        adapter::InMemoryConsensus,
        app::{BlockContext, ConsensusApp},
        types::Event,
    };

    struct RoothashStub {
        round: u64,
    }

    impl ConsensusApp for RoothashStub {
        fn name(&self) -> &'static str {
            ROOTHASH_APP_NAME
        }

        fn methods(&self) -> &'static [&'static str] {
            &[]
        }

        fn execute_tx(&mut self, _ctx: &BlockContext, _method: &str, _body: &[u8]) -> Result<Vec<u8>, ConsensusError> {
            unreachable!()
        }

        fn end_block(&mut self, _ctx: &BlockContext) -> Result<Vec<Event>, ConsensusError> {
            self.round += 1;
            let finalized = ValueFinalized {
                id: Namespace::default(),
                round: self.round,
            };
            Ok(vec![Event {
                app: ROOTHASH_APP_NAME,
                kind: EVENT_KIND_FINALIZED,
                value: cbor::to_vec(&finalized),
            }])
        }
    }

    #[tokio::test]
    async fn test_reindex_replays_missing_finalized_rounds() {
        let consensus = InMemoryConsensus::new();
        consensus.with_mux(|mux| mux.register(Box::new(RoothashStub { round: 0 })).unwrap());
        consensus.commit_block(&[]).unwrap();
        consensus.commit_block(&[]).unwrap();
        consensus.commit_block(&[]).unwrap();

        let logger = oasis_core_common::logger::get_logger("test");
        let mut committed = Vec::new();
        let new_indexed = reindex(&consensus, 0, &logger, |id, round| committed.push((id, round)))
            .await
            .unwrap();

        assert_eq!(new_indexed, 3);
        assert_eq!(committed.iter().map(|(_, r)| *r).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reindex_resumes_from_last_indexed_height() {
        let consensus = InMemoryConsensus::new();
        consensus.with_mux(|mux| mux.register(Box::new(RoothashStub { round: 0 })).unwrap());
        consensus.commit_block(&[]).unwrap();
        consensus.commit_block(&[]).unwrap();

        let logger = oasis_core_common::logger::get_logger("test");
        let mut committed = Vec::new();
        let new_indexed = reindex(&consensus, 1, &logger, |id, round| committed.push((id, round)))
            .await
            .unwrap();

        assert_eq!(new_indexed, 2);
        assert_eq!(committed.iter().map(|(_, r)| *r).collect::<Vec<_>>(), vec![2]);
    }
}
