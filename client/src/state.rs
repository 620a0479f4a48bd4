//! Per-runtime client watcher: tracks the compute committee leader across
//! epoch transitions and correlates finalized block inputs/outputs back
//! to callers waiting on `submit_tx`.
//!
//! Grounded on spec.md §4.7 and, for the leader hand-off shape,
//! `runtime/client/src/manager.rs`'s `RuntimeClientManager` (committee
//! stream drives a `RwLock<Option<Leader>>`, callers block on a future
//! until the first leader is known) — reworked from its `futures` 0.1
//! `streamfollow`/`oneshot` combinators onto `tokio::sync::mpsc`, since
//! a watcher here tracks many concurrently pending requests rather than
//! one shared one-shot.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use oasis_core_common::{crypto::Hash, Namespace};
use oasis_core_registry::{types::Node, Registry};
use oasis_core_roothash::types::{AnnotatedBlock, Header, HeaderType};
use oasis_core_scheduler::{types::{Committee, CommitteeKind}, CommitteeSnapshot};
use oasis_core_storage::Storage;
use slog::{debug, Logger};
use tokio::sync::mpsc;

use crate::{
    error::ClientError,
    transport::LeaderTransport,
    types::{Delivery, SubmitResult},
};

pub struct ClientWatcher {
    runtime_id: Namespace,
    registry: Arc<Mutex<Registry>>,
    storage: Arc<dyn Storage>,
    transport: Arc<dyn LeaderTransport>,
    logger: Logger,
    leader: Mutex<Option<Node>>,
    executor_committee: Mutex<Option<Committee>>,
    pending: Mutex<HashMap<Hash, mpsc::UnboundedSender<Delivery>>>,
    started: Mutex<bool>,
}

impl ClientWatcher {
    pub fn new(
        runtime_id: Namespace,
        registry: Arc<Mutex<Registry>>,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn LeaderTransport>,
    ) -> Self {
        ClientWatcher {
            runtime_id,
            registry,
            storage,
            transport,
            logger: oasis_core_common::logger::get_logger("client::watcher"),
            leader: Mutex::new(None),
            executor_committee: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            started: Mutex::new(false),
        }
    }

    pub fn current_leader(&self) -> Option<Node> {
        self.leader.lock().unwrap().clone()
    }

    /// Called on every new committee snapshot (normally once per epoch).
    pub fn on_committee_snapshot(&self, snapshot: &CommitteeSnapshot) {
        let committee = snapshot.get(&(self.runtime_id, CommitteeKind::Executor)).cloned();
        *self.executor_committee.lock().unwrap() = committee;
    }

    /// Called on every finalized block for this runtime, in round order.
    pub fn on_block(&self, block: &AnnotatedBlock) {
        let header = &block.block.header;
        let first_block = {
            let mut started = self.started.lock().unwrap();
            let was_first = !*started;
            *started = true;
            was_first
        };
        if header.header_type == HeaderType::EpochTransition || first_block {
            self.resolve_leader();
        }
        if header.header_type == HeaderType::Normal {
            self.deliver_io(header);
        }
        // RoundFailed/Suspended/Invalid: continue without delivering.
    }

    fn resolve_leader(&self) {
        let committee = match self.executor_committee.lock().unwrap().clone() {
            Some(committee) => committee,
            None => return,
        };
        let leader_member = match committee.leader() {
            Some(member) => member.public_key,
            None => return,
        };
        let node = match self.registry.lock().unwrap().get_node(&leader_member) {
            Some(node) => node,
            None => return,
        };
        debug!(self.logger, "compute committee leader resolved"; "leader" => format!("{:?}", leader_member));
        *self.leader.lock().unwrap() = Some(node);

        let pending = self.pending.lock().unwrap();
        for sender in pending.values() {
            let _ = sender.send(Delivery::NewLeader(leader_member));
        }
    }

    fn deliver_io(&self, header: &Header) {
        let inputs: Vec<Vec<u8>> = match self.fetch_batch(header.input_hash) {
            Some(inputs) => inputs,
            None => return,
        };
        let outputs: Vec<Vec<u8>> = match self.fetch_batch(header.output_hash) {
            Some(outputs) => outputs,
            None => return,
        };

        let mut pending = self.pending.lock().unwrap();
        for (index, input) in inputs.iter().enumerate() {
            let input_hash = Hash::digest_bytes(input);
            if let Some(sender) = pending.remove(&input_hash) {
                let output = outputs.get(index).cloned().unwrap_or_default();
                let _ = sender.send(Delivery::Output { output, ok: true });
            }
        }
    }

    fn fetch_batch(&self, key: Hash) -> Option<Vec<Vec<u8>>> {
        let bytes = self.storage.get(key).ok()?;
        oasis_core_common::cbor::from_slice(&bytes).ok()
    }

    /// Register a new watch for `input_hash`. Per spec.md §4.7's
    /// `new_watch`, if a leader is already known it is delivered
    /// immediately so the caller can submit without waiting for the next
    /// epoch transition.
    pub fn new_watch(&self, input_hash: Hash) -> mpsc::UnboundedReceiver<Delivery> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(leader) = self.leader.lock().unwrap().as_ref() {
            let _ = tx.send(Delivery::NewLeader(leader.id));
        }
        self.pending.lock().unwrap().insert(input_hash, tx);
        rx
    }

    /// Submit a transaction to the current leader, resubmitting whenever
    /// the leader changes, until the matching output is delivered.
    pub async fn submit_tx(&self, data: Vec<u8>) -> Result<SubmitResult, ClientError> {
        let input_hash = Hash::digest_bytes(&data);
        let mut rx = self.new_watch(input_hash);
        loop {
            match rx.recv().await {
                Some(Delivery::NewLeader(_)) => {
                    if let Some(leader) = self.current_leader() {
                        self.transport.submit(&leader, self.runtime_id, data.clone()).await?;
                    }
                }
                Some(Delivery::Output { output, ok }) => return Ok(SubmitResult { output, ok }),
                None => return Err(ClientError::Cancelled),
            }
        }
    }
}
