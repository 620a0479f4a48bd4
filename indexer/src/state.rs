//! Transaction indexer: durable `(runtime_id, round, index)` primary key
//! with `tx_hash`/`block_hash` secondary indices and an optional tag
//! index, grounded on spec.md §4.8's index layout. No teacher file owns
//! this (the ekiden-era pack has no indexer; transaction lookup lived in
//! the since-removed `clients`/`tools` directories' ad-hoc gRPC calls);
//! built directly from spec.md's key layout and `wait_block_indexed`'s
//! "blocks until durably committed, `NotFound` for impossible rounds"
//! semantics.
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use oasis_core_common::{crypto::Hash, Namespace, Round};
use tokio::sync::Notify;

use crate::{
    error::IndexerError,
    types::{IndexedTransaction, NewTransaction, Query},
};

#[derive(Default)]
struct Inner {
    transactions: BTreeMap<(Namespace, Round, u32), IndexedTransaction>,
    by_tx_hash: HashMap<(Namespace, Hash), (Round, u32)>,
    by_block_hash: HashMap<(Namespace, Hash), Round>,
    tags: HashMap<(Namespace, Vec<u8>, Vec<u8>), Vec<(Round, u32)>>,
    last_indexed_round: HashMap<Namespace, Round>,
}

#[derive(Default)]
pub struct Indexer {
    inner: Mutex<Inner>,
    notify: Mutex<HashMap<Namespace, Arc<Notify>>>,
}

impl Indexer {
    pub fn new() -> Self {
        Indexer::default()
    }

    fn notify_for(&self, runtime_id: Namespace) -> Arc<Notify> {
        self.notify
            .lock()
            .unwrap()
            .entry(runtime_id)
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Durably commit every transaction of `round`, assigning each its
    /// index by position, then wake any `wait_block_indexed` callers.
    pub fn index_block(&self, runtime_id: Namespace, round: Round, block_hash: Hash, txs: Vec<NewTransaction>) {
        {
            let mut inner = self.inner.lock().unwrap();
            for (index, tx) in txs.into_iter().enumerate() {
                let index = index as u32;
                for (key, value) in &tx.tags {
                    inner
                        .tags
                        .entry((runtime_id, key.clone(), value.clone()))
                        .or_default()
                        .push((round, index));
                }
                inner.by_tx_hash.insert((runtime_id, tx.tx_hash), (round, index));
                inner.transactions.insert(
                    (runtime_id, round, index),
                    IndexedTransaction {
                        runtime_id,
                        round,
                        index,
                        tx_hash: tx.tx_hash,
                        block_hash,
                        tags: tx.tags,
                    },
                );
            }
            inner.by_block_hash.insert((runtime_id, block_hash), round);
            let last = inner.last_indexed_round.entry(runtime_id).or_insert(0);
            *last = round.max(*last);
        }
        self.notify_for(runtime_id).notify_waiters();
    }

    pub fn get_txn(&self, runtime_id: Namespace, round: Round, index: u32) -> Result<IndexedTransaction, IndexerError> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .get(&(runtime_id, round, index))
            .cloned()
            .ok_or(IndexerError::NotFound)
    }

    pub fn get_txn_by_tx_hash(&self, runtime_id: Namespace, tx_hash: Hash) -> Result<IndexedTransaction, IndexerError> {
        let inner = self.inner.lock().unwrap();
        let (round, index) = inner.by_tx_hash.get(&(runtime_id, tx_hash)).ok_or(IndexerError::NotFound)?;
        inner
            .transactions
            .get(&(runtime_id, *round, *index))
            .cloned()
            .ok_or(IndexerError::NotFound)
    }

    pub fn get_txn_by_block_hash(&self, runtime_id: Namespace, block_hash: Hash, index: u32) -> Result<IndexedTransaction, IndexerError> {
        let inner = self.inner.lock().unwrap();
        let round = *inner.by_block_hash.get(&(runtime_id, block_hash)).ok_or(IndexerError::NotFound)?;
        inner
            .transactions
            .get(&(runtime_id, round, index))
            .cloned()
            .ok_or(IndexerError::NotFound)
    }

    pub fn get_transactions(&self, runtime_id: Namespace, round: Round) -> Result<Vec<IndexedTransaction>, IndexerError> {
        let inner = self.inner.lock().unwrap();
        let txs: Vec<IndexedTransaction> = inner
            .transactions
            .range((runtime_id, round, 0)..(runtime_id, round, u32::MAX))
            .map(|(_, tx)| tx.clone())
            .collect();
        let round_exists = inner
            .by_block_hash
            .iter()
            .any(|((rt, _), r)| *rt == runtime_id && *r == round);
        if txs.is_empty() && !round_exists {
            return Err(IndexerError::NotFound);
        }
        Ok(txs)
    }

    /// First transaction whose tags include `(key, value)`, per spec.md
    /// §6's single-result `QueryTxn`.
    pub fn query_txn(&self, runtime_id: Namespace, key: &[u8], value: &[u8]) -> Result<IndexedTransaction, IndexerError> {
        let inner = self.inner.lock().unwrap();
        let (round, index) = inner
            .tags
            .get(&(runtime_id, key.to_vec(), value.to_vec()))
            .and_then(|matches| matches.first())
            .ok_or(IndexerError::NotFound)?;
        inner
            .transactions
            .get(&(runtime_id, *round, *index))
            .cloned()
            .ok_or(IndexerError::NotFound)
    }

    /// Every transaction matching all of `query.conditions`, capped at
    /// `query.limit` if set.
    pub fn query_txns(&self, runtime_id: Namespace, query: &Query) -> Vec<IndexedTransaction> {
        if query.conditions.is_empty() {
            return Vec::new();
        }
        let inner = self.inner.lock().unwrap();
        let mut candidates: Option<std::collections::BTreeSet<(Round, u32)>> = None;
        for (key, value) in &query.conditions {
            let matches: std::collections::BTreeSet<(Round, u32)> = inner
                .tags
                .get(&(runtime_id, key.clone(), value.clone()))
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .collect();
            candidates = Some(match candidates {
                Some(existing) => existing.intersection(&matches).copied().collect(),
                None => matches,
            });
        }
        let mut results: Vec<IndexedTransaction> = candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(round, index)| inner.transactions.get(&(runtime_id, round, index)).cloned())
            .collect();
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        results
    }

    /// Blocks until `round` has been durably indexed. Returns `NotFound`
    /// immediately, without waiting, for a round that cannot exist —
    /// i.e. one past `known_tip`.
    pub async fn wait_block_indexed(&self, runtime_id: Namespace, round: Round, known_tip: Round) -> Result<(), IndexerError> {
        if round > known_tip {
            return Err(IndexerError::NotFound);
        }
        loop {
            let notified = self.notify_for(runtime_id).notified();
            let last = *self.inner.lock().unwrap().last_indexed_round.get(&runtime_id).unwrap_or(&0);
            if last >= round {
                return Ok(());
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn namespace(byte: u8) -> Namespace {
        Namespace::from_bytes([byte; 32])
    }

    fn tx(hash_byte: u8) -> NewTransaction {
        NewTransaction {
            tx_hash: Hash::digest_bytes(&[hash_byte]),
            tags: vec![(b"sender".to_vec(), vec![hash_byte])],
        }
    }

    #[test]
    fn test_index_and_look_up_by_every_key() {
        let indexer = Indexer::new();
        let rt = namespace(1);
        let block_hash = Hash::digest_bytes(b"block-1");
        indexer.index_block(rt, 1, block_hash, vec![tx(1), tx(2)]);

        let by_round = indexer.get_txn(rt, 1, 1).unwrap();
        assert_eq!(by_round.tx_hash, Hash::digest_bytes(&[2]));

        let by_hash = indexer.get_txn_by_tx_hash(rt, Hash::digest_bytes(&[1])).unwrap();
        assert_eq!(by_hash.index, 0);

        let by_block = indexer.get_txn_by_block_hash(rt, block_hash, 0).unwrap();
        assert_eq!(by_block.tx_hash, Hash::digest_bytes(&[1]));

        assert_eq!(indexer.get_transactions(rt, 1).unwrap().len(), 2);
    }

    #[test]
    fn test_query_txns_intersects_conditions() {
        let indexer = Indexer::new();
        let rt = namespace(2);
        indexer.index_block(rt, 1, Hash::empty_hash(), vec![tx(1), tx(2)]);

        let query = Query {
            conditions: vec![(b"sender".to_vec(), vec![1u8])],
            limit: None,
        };
        let results = indexer.query_txns(rt, &query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tx_hash, Hash::digest_bytes(&[1]));
    }

    #[tokio::test]
    async fn test_wait_block_indexed_rejects_impossible_round() {
        let indexer = Indexer::new();
        let rt = namespace(3);
        assert!(matches!(
            indexer.wait_block_indexed(rt, 5, 2).await,
            Err(IndexerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_wait_block_indexed_unblocks_on_index() {
        let indexer = Arc::new(Indexer::new());
        let rt = namespace(4);
        let waiter = {
            let indexer = indexer.clone();
            tokio::spawn(async move { indexer.wait_block_indexed(rt, 1, 1).await })
        };
        tokio::task::yield_now().await;
        indexer.index_block(rt, 1, Hash::empty_hash(), vec![tx(1)]);
        waiter.await.unwrap().unwrap();
    }
}
