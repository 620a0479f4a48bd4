//! `Consensus`: the read/write surface the committee node loop, client
//! watcher and indexer actually depend on, plus [`InMemoryConsensus`], a
//! mock standing in for the real BFT engine (out of scope per the
//! system's non-goals — consensus/optimistic's `OptimisticConsensusBackend`
//! in the teacher pack is the nearest ancestor, but its gRPC-era
//! `BoxFuture` interface is not carried forward).
use std::sync::{atomic::{AtomicU64, Ordering}, Mutex};

use oasis_core_common::broker::{Broker, BrokerStream};
use tokio::sync::broadcast;

use crate::{
    app::BlockContext,
    error::ConsensusError,
    mux::Mux,
    types::{BlockResults, CheckResult, ConsensusBlock, DeliverResult, Event, SignedTransaction},
};

/// Opaque handle to a fixed, immutable view of application state. The real
/// engine would back this with a versioned tree; the mock only needs the
/// height to route subsequent `query` calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImmutableState {
    pub height: i64,
}

/// Subscription returned by [`Consensus::subscribe`]. `pattern` is either
/// `"app"` (all of that app's events) or `"app.kind"` (one event kind).
pub struct EventWatch {
    receiver: broadcast::Receiver<Event>,
    pattern: String,
}

impl EventWatch {
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event_matches(&self.pattern, &event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

fn event_matches(pattern: &str, event: &Event) -> bool {
    match pattern.split_once('.') {
        Some((app, kind)) => event.app == app && event.kind == kind,
        None => event.app == pattern,
    }
}

#[async_trait::async_trait]
pub trait Consensus: Send + Sync {
    async fn broadcast_tx(&self, tx: SignedTransaction) -> Result<DeliverResult, ConsensusError>;
    async fn query(&self, app: &str, path: &str, payload: &[u8], height: i64) -> Result<Vec<u8>, ConsensusError>;
    fn subscribe(&self, pattern: &str) -> EventWatch;
    async fn get_block(&self, height: i64) -> Result<ConsensusBlock, ConsensusError>;
    async fn get_block_results(&self, height: i64) -> Result<BlockResults, ConsensusError>;
    fn watch_blocks(&self) -> BrokerStream<ConsensusBlock>;
    fn state_at(&self, height: i64) -> Result<ImmutableState, ConsensusError>;
    /// Height of the most recently committed block, or `0` before genesis.
    fn latest_height(&self) -> i64;
}

/// In-memory mock: every call to [`InMemoryConsensus::commit_block`] plays
/// the role the real BFT engine would — proposing, ordering and finalizing
/// one height — so tests can drive the applications deterministically.
pub struct InMemoryConsensus {
    mux: Mutex<Mux>,
    blocks: Broker<ConsensusBlock>,
    events: broadcast::Sender<Event>,
    clock: AtomicU64,
}

impl InMemoryConsensus {
    pub fn new() -> Self {
        InMemoryConsensus {
            mux: Mutex::new(Mux::new()),
            blocks: Broker::new(256),
            events: broadcast::channel(1024).0,
            clock: AtomicU64::new(0),
        }
    }

    pub fn with_mux<R>(&self, f: impl FnOnce(&mut Mux) -> R) -> R {
        f(&mut self.mux.lock().unwrap())
    }

    /// Begin/execute/end one height, in the order the transactions were
    /// given, and publish the resulting block and its events.
    pub fn commit_block(&self, txs: &[SignedTransaction]) -> Result<(ConsensusBlock, BlockResults, Vec<DeliverResult>), ConsensusError> {
        let time = self.clock.fetch_add(1, Ordering::SeqCst);
        let mut mux = self.mux.lock().unwrap();
        let height = mux.tip_height() + 1;
        let ctx = BlockContext { height, time };
        mux.begin_block(&ctx)?;
        let delivered: Vec<DeliverResult> = txs.iter().map(|tx| mux.execute_tx(&ctx, tx)).collect();
        let (block, results) = mux.end_block(&ctx)?;
        drop(mux);

        for event in &results.events {
            let _ = self.events.send(event.clone());
        }
        self.blocks.publish(block.clone());
        Ok((block, results, delivered))
    }
}

impl Default for InMemoryConsensus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Consensus for InMemoryConsensus {
    async fn broadcast_tx(&self, tx: SignedTransaction) -> Result<DeliverResult, ConsensusError> {
        let (has_blocks, check) = self.with_mux(|mux| (!mux.history().is_empty(), mux.check_tx(&tx)));
        if !has_blocks {
            return Err(ConsensusError::NoCommittedBlocks);
        }
        if let CheckResult::Rejected(reason) = check {
            return Ok(DeliverResult::Failed(reason));
        }
        let (_, _, mut delivered) = self.commit_block(std::slice::from_ref(&tx))?;
        Ok(delivered.pop().expect("one tx submitted, one result returned"))
    }

    async fn query(&self, app: &str, path: &str, payload: &[u8], height: i64) -> Result<Vec<u8>, ConsensusError> {
        self.with_mux(|mux| mux.query(app, path, payload, height))
    }

    fn subscribe(&self, pattern: &str) -> EventWatch {
        EventWatch {
            receiver: self.events.subscribe(),
            pattern: pattern.to_string(),
        }
    }

    async fn get_block(&self, height: i64) -> Result<ConsensusBlock, ConsensusError> {
        self.with_mux(|mux| mux.get_block(height).cloned().ok_or(ConsensusError::NoSuchBlock))
    }

    async fn get_block_results(&self, height: i64) -> Result<BlockResults, ConsensusError> {
        self.with_mux(|mux| mux.get_block_results(height).cloned().ok_or(ConsensusError::NoSuchBlock))
    }

    fn watch_blocks(&self) -> BrokerStream<ConsensusBlock> {
        self.blocks.subscribe()
    }

    fn state_at(&self, height: i64) -> Result<ImmutableState, ConsensusError> {
        let tip = self.with_mux(|mux| mux.tip_height());
        if height < 1 || height > tip {
            return Err(ConsensusError::NoSuchBlock);
        }
        Ok(ImmutableState { height })
    }

    fn latest_height(&self) -> i64 {
        self.with_mux(|mux| mux.tip_height())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{app::ConsensusApp, types::{Event, EVENT_KIND_FINALIZED}};

    struct EchoApp;

    impl ConsensusApp for EchoApp {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn methods(&self) -> &'static [&'static str] {
            &["Ping"]
        }

        fn execute_tx(&mut self, _ctx: &BlockContext, _method: &str, body: &[u8]) -> Result<Vec<u8>, ConsensusError> {
            Ok(body.to_vec())
        }

        fn end_block(&mut self, ctx: &BlockContext) -> Result<Vec<Event>, ConsensusError> {
            Ok(vec![Event {
                app: "echo",
                kind: EVENT_KIND_FINALIZED,
                value: ctx.height.to_le_bytes().to_vec(),
            }])
        }
    }

    #[tokio::test]
    async fn test_broadcast_tx_rejected_before_genesis() {
        let consensus = InMemoryConsensus::new();
        consensus.with_mux(|mux| mux.register(Box::new(EchoApp)).unwrap());

        let signer = oasis_core_common::MemorySigner::from_seed(&[7u8; 32]);
        let tx = SignedTransaction::sign(
            &signer,
            crate::types::TRANSACTION_SIGNATURE_CONTEXT,
            &crate::types::Transaction {
                nonce: 0,
                fee: Default::default(),
                method: "echo.Ping".to_string(),
                body: Vec::new(),
            },
        );
        assert!(matches!(
            consensus.broadcast_tx(tx).await,
            Err(ConsensusError::NoCommittedBlocks)
        ));
    }

    #[tokio::test]
    async fn test_watch_blocks_replays_then_streams_events() {
        let consensus = InMemoryConsensus::new();
        consensus.with_mux(|mux| mux.register(Box::new(EchoApp)).unwrap());
        consensus.commit_block(&[]).unwrap();

        let mut blocks = consensus.watch_blocks();
        assert_eq!(blocks.recv().await.unwrap().height, 1);

        let mut events = consensus.subscribe("echo.finalized");
        consensus.commit_block(&[]).unwrap();
        assert_eq!(blocks.recv().await.unwrap().height, 2);
        assert_eq!(events.recv().await.unwrap().kind, EVENT_KIND_FINALIZED);
    }
}
