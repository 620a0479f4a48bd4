//! Read-only RPC surface over block history, the transaction indexer and
//! the out-of-scope enclave call boundary (spec.md §6's client RPCs,
//! minus `SubmitTx`, which [`crate::ClientWatcher`] owns directly).
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use oasis_core_common::{crypto::Hash, EpochTime, Namespace};
use oasis_core_indexer::{IndexedTransaction, Indexer, Query};
use oasis_core_roothash::{types::AnnotatedBlock, BlockBroker, BlockWatch};
use oasis_core_storage::Storage;
use tokio::sync::watch;

use crate::error::ClientError;

/// The out-of-scope sandboxed-enclave call surface (spec.md §1 excludes
/// TEE attestation and enclave loading); this trait is the boundary
/// `CallEnclave` dispatches through, mirroring `RuntimeHost`/
/// `LeaderTransport`'s out-of-scope-collaborator shape.
#[async_trait]
pub trait EnclaveRpc: Send + Sync {
    async fn call(&self, endpoint: &str, payload: Vec<u8>) -> Result<Vec<u8>, ClientError>;
}

pub struct RejectingEnclaveRpc;

#[async_trait]
impl EnclaveRpc for RejectingEnclaveRpc {
    async fn call(&self, _endpoint: &str, _payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        Err(ClientError::NotFound)
    }
}

pub struct ClientRpc {
    runtime_id: Namespace,
    blocks: Mutex<HashMap<u64, AnnotatedBlock>>,
    by_hash: Mutex<HashMap<Hash, u64>>,
    tip: Mutex<u64>,
    epoch: watch::Sender<EpochTime>,
    block_broker: Arc<BlockBroker>,
    indexer: Arc<Indexer>,
    storage: Arc<dyn Storage>,
    enclave: Arc<dyn EnclaveRpc>,
}

impl ClientRpc {
    pub fn new(
        runtime_id: Namespace,
        block_broker: Arc<BlockBroker>,
        indexer: Arc<Indexer>,
        storage: Arc<dyn Storage>,
        enclave: Arc<dyn EnclaveRpc>,
    ) -> Self {
        let (epoch, _) = watch::channel(0);
        ClientRpc {
            runtime_id,
            blocks: Mutex::new(HashMap::new()),
            by_hash: Mutex::new(HashMap::new()),
            tip: Mutex::new(0),
            epoch,
            block_broker,
            indexer,
            storage,
            enclave,
        }
    }

    /// Record a finalized block into this runtime's history, keyed by
    /// round and by header hash for `GetBlock`/`QueryBlock`.
    pub fn record_block(&self, block: AnnotatedBlock) {
        let round = block.block.header.round;
        let hash = block.block.header.encoded_hash();
        self.blocks.lock().unwrap().insert(round, block);
        self.by_hash.lock().unwrap().insert(hash, round);
        let mut tip = self.tip.lock().unwrap();
        *tip = round.max(*tip);
    }

    pub fn set_epoch(&self, epoch: EpochTime) {
        let _ = self.epoch.send(epoch);
    }

    /// Blocks until the consensus epoch reaches at least `target`.
    pub async fn wait_epoch(&self, target: EpochTime) {
        let mut rx = self.epoch.subscribe();
        while *rx.borrow() < target {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn watch_blocks(&self) -> BlockWatch {
        self.block_broker.subscribe()
    }

    pub fn get_block(&self, round: u64) -> Result<AnnotatedBlock, ClientError> {
        self.blocks.lock().unwrap().get(&round).cloned().ok_or(ClientError::NotFound)
    }

    pub fn query_block(&self, block_hash: Hash) -> Result<AnnotatedBlock, ClientError> {
        let round = *self.by_hash.lock().unwrap().get(&block_hash).ok_or(ClientError::NotFound)?;
        self.get_block(round)
    }

    /// Fetch the canonically-encoded batch of transactions stored under a
    /// round's `input_hash`/`output_hash` root.
    pub fn get_transactions(&self, root: Hash) -> Result<Vec<Vec<u8>>, ClientError> {
        let bytes = self.storage.get(root).map_err(|_| ClientError::NotFound)?;
        oasis_core_common::cbor::from_slice(&bytes).map_err(|_| ClientError::NotFound)
    }

    pub fn get_txn(&self, round: u64, index: u32) -> Result<IndexedTransaction, ClientError> {
        self.indexer.get_txn(self.runtime_id, round, index).map_err(|_| ClientError::NotFound)
    }

    pub fn get_txn_by_block_hash(&self, block_hash: Hash, index: u32) -> Result<IndexedTransaction, ClientError> {
        self.indexer
            .get_txn_by_block_hash(self.runtime_id, block_hash, index)
            .map_err(|_| ClientError::NotFound)
    }

    pub fn query_txn(&self, key: &[u8], value: &[u8]) -> Result<IndexedTransaction, ClientError> {
        self.indexer.query_txn(self.runtime_id, key, value).map_err(|_| ClientError::NotFound)
    }

    pub fn query_txns(&self, query: &Query) -> Vec<IndexedTransaction> {
        self.indexer.query_txns(self.runtime_id, query)
    }

    pub async fn wait_block_indexed(&self, round: u64) -> Result<(), ClientError> {
        let known_tip = *self.tip.lock().unwrap();
        self.indexer
            .wait_block_indexed(self.runtime_id, round, known_tip)
            .await
            .map_err(|_| ClientError::NotFound)
    }

    pub async fn call_enclave(&self, endpoint: &str, payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        self.enclave.call(endpoint, payload).await
    }
}
