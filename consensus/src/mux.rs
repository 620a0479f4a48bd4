//! The multiplexer: owns every registered [`ConsensusApp`] in dependency
//! order and drives `begin_block` → `execute_tx`* → `end_block` for each
//! height, chaining committed blocks into history.
//!
//! Grounded on the Design Notes' "ABCI multiplexer" mapping (a single
//! dispatcher routing by method name, honoring `staking before registry
//! before roothash` dependency ordering) and "Shared consensus state with
//! check-tx / deliver-tx dual tree", expressed here as `check_tx` doing
//! read-only method/method-table validation while `execute_tx` is the only
//! path that durably mutates application state.
use oasis_core_common::crypto::Hash;

use crate::{
    app::{BlockContext, ConsensusApp},
    error::ConsensusError,
    types::{BlockResults, CheckResult, ConsensusBlock, DeliverResult, SignedTransaction, TRANSACTION_SIGNATURE_CONTEXT},
};

/// Query path prefix reserved for peer-filter decisions (e.g. "should this
/// node's gossip peer be admitted"). Only the blessed app may answer it,
/// regardless of which app name the caller addressed.
pub const PEER_FILTER_QUERY_PREFIX: &str = "peer_filter/";

pub struct Mux {
    apps: Vec<Box<dyn ConsensusApp>>,
    blessed: Option<&'static str>,
    history: Vec<ConsensusBlock>,
    results: Vec<BlockResults>,
}

impl Mux {
    pub fn new() -> Self {
        Mux {
            apps: Vec::new(),
            blessed: None,
            history: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Register an app. Dependencies must already be registered; this is
    /// how `staking before registry before roothash` ordering is enforced
    /// (by construction order, not by a runtime topological sort).
    pub fn register(&mut self, mut app: Box<dyn ConsensusApp>) -> Result<(), ConsensusError> {
        if self.apps.iter().any(|a| a.name() == app.name()) {
            return Err(ConsensusError::DuplicateApp(app.name()));
        }
        for dep in app.dependencies() {
            if !self.apps.iter().any(|a| a.name() == *dep) {
                return Err(ConsensusError::MissingDependency(dep));
            }
        }
        app.on_register();
        self.apps.push(app);
        Ok(())
    }

    /// Mark `app` as the sole handler of peer-filter queries. Idempotent;
    /// a later call replaces an earlier one rather than stacking.
    pub fn bless(&mut self, app: &'static str) {
        self.blessed = Some(app);
    }

    pub fn tip_height(&self) -> i64 {
        self.history.last().map(|b| b.height).unwrap_or(0)
    }

    pub fn begin_block(&mut self, ctx: &BlockContext) -> Result<(), ConsensusError> {
        for app in self.apps.iter_mut() {
            app.begin_block(ctx)?;
        }
        Ok(())
    }

    /// Speculative admission check, independent of `execute_tx`: validates
    /// the signature and that the method resolves to a registered app, but
    /// performs no state mutation.
    pub fn check_tx(&self, tx: &SignedTransaction) -> CheckResult {
        let value = match tx.open(TRANSACTION_SIGNATURE_CONTEXT) {
            Ok(value) => value,
            Err(err) => return CheckResult::Rejected(err.to_string()),
        };
        match value.method.split_once('.') {
            Some((app_name, method)) => {
                let known = self
                    .apps
                    .iter()
                    .any(|a| a.name() == app_name && a.methods().contains(&method));
                if known {
                    CheckResult::Accepted
                } else {
                    CheckResult::Rejected(format!("unknown method {}", value.method))
                }
            }
            None => CheckResult::Rejected(format!("malformed method {:?}", value.method)),
        }
    }

    /// Execute a transaction's method against the owning app. Any failure
    /// aborts only this transaction; it never poisons the block.
    pub fn execute_tx(&mut self, ctx: &BlockContext, tx: &SignedTransaction) -> DeliverResult {
        let value = match tx.open(TRANSACTION_SIGNATURE_CONTEXT) {
            Ok(value) => value,
            Err(err) => return DeliverResult::Failed(err.to_string()),
        };
        let (app_name, method) = match value.method.split_once('.') {
            Some(parts) => parts,
            None => return DeliverResult::Failed(format!("malformed method {:?}", value.method)),
        };
        let app = match self.apps.iter_mut().find(|a| a.name() == app_name) {
            Some(app) => app,
            None => return DeliverResult::Failed(format!("no such application {}", app_name)),
        };
        if !app.methods().contains(&method) {
            return DeliverResult::Failed(format!("method not supported: {}", value.method));
        }
        match app.execute_tx(ctx, method, &value.body) {
            Ok(output) => DeliverResult::Ok(output),
            Err(err) => DeliverResult::Failed(err.to_string()),
        }
    }

    /// Drain every app's end-of-block events and commit the resulting
    /// block to history, chained from the previous tip's hash.
    pub fn end_block(&mut self, ctx: &BlockContext) -> Result<(ConsensusBlock, BlockResults), ConsensusError> {
        let mut events = Vec::new();
        for app in self.apps.iter_mut() {
            events.extend(app.end_block(ctx)?);
        }
        let previous_hash = self.history.last().map(|b| b.hash).unwrap_or_else(Hash::empty_hash);
        let hash = Hash::digest_bytes(&oasis_core_common::cbor::to_vec(&(ctx.height, ctx.time, previous_hash, &events)));
        let block = ConsensusBlock {
            height: ctx.height,
            hash,
            previous_hash,
            time: ctx.time,
        };
        let results = BlockResults {
            height: ctx.height,
            events,
        };
        self.history.push(block.clone());
        self.results.push(results.clone());
        Ok((block, results))
    }

    pub fn query(&self, app_name: &str, path: &str, payload: &[u8], height: i64) -> Result<Vec<u8>, ConsensusError> {
        if self.history.is_empty() {
            return Err(ConsensusError::NoCommittedBlocks);
        }
        if path.starts_with(PEER_FILTER_QUERY_PREFIX) && self.blessed != Some(app_name) {
            return Err(ConsensusError::NotBlessed);
        }
        let app = self
            .apps
            .iter()
            .find(|a| a.name() == app_name)
            .ok_or_else(|| ConsensusError::NoSuchApp(app_name.to_string()))?;
        app.query(path, payload, height)
    }

    pub fn history(&self) -> &[ConsensusBlock] {
        &self.history
    }

    pub fn block_results(&self) -> &[BlockResults] {
        &self.results
    }

    pub fn get_block(&self, height: i64) -> Option<&ConsensusBlock> {
        self.history.iter().find(|b| b.height == height)
    }

    pub fn get_block_results(&self, height: i64) -> Option<&BlockResults> {
        self.results.iter().find(|r| r.height == height)
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Event;

    struct NoopApp;

    impl ConsensusApp for NoopApp {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn methods(&self) -> &'static [&'static str] {
            &["Ping"]
        }

        fn execute_tx(&mut self, _ctx: &BlockContext, _method: &str, _body: &[u8]) -> Result<Vec<u8>, ConsensusError> {
            Ok(Vec::new())
        }

        fn end_block(&mut self, _ctx: &BlockContext) -> Result<Vec<Event>, ConsensusError> {
            Ok(vec![Event {
                app: "noop",
                kind: "pinged",
                value: Vec::new(),
            }])
        }

        fn query(&self, _path: &str, _payload: &[u8], _height: i64) -> Result<Vec<u8>, ConsensusError> {
            Ok(Vec::new())
        }
    }

    struct DependentApp;

    impl ConsensusApp for DependentApp {
        fn name(&self) -> &'static str {
            "dependent"
        }

        fn dependencies(&self) -> &'static [&'static str] {
            &["noop"]
        }

        fn methods(&self) -> &'static [&'static str] {
            &[]
        }

        fn execute_tx(&mut self, _ctx: &BlockContext, _method: &str, _body: &[u8]) -> Result<Vec<u8>, ConsensusError> {
            unreachable!()
        }
    }

    #[test]
    fn test_dependency_ordering_enforced() {
        let mut mux = Mux::new();
        assert!(matches!(
            mux.register(Box::new(DependentApp)),
            Err(ConsensusError::MissingDependency("noop"))
        ));
        mux.register(Box::new(NoopApp)).unwrap();
        mux.register(Box::new(DependentApp)).unwrap();
    }

    #[test]
    fn test_query_rejected_before_genesis() {
        let mut mux = Mux::new();
        mux.register(Box::new(NoopApp)).unwrap();
        assert!(matches!(
            mux.query("noop", "state", &[], 0),
            Err(ConsensusError::NoCommittedBlocks)
        ));
    }

    #[test]
    fn test_end_block_chains_blocks_and_collects_events() {
        let mut mux = Mux::new();
        mux.register(Box::new(NoopApp)).unwrap();

        let ctx = BlockContext { height: 1, time: 100 };
        mux.begin_block(&ctx).unwrap();
        let (block1, results1) = mux.end_block(&ctx).unwrap();
        assert_eq!(block1.previous_hash, Hash::empty_hash());
        assert_eq!(results1.events.len(), 1);

        let ctx2 = BlockContext { height: 2, time: 200 };
        mux.begin_block(&ctx2).unwrap();
        let (block2, _) = mux.end_block(&ctx2).unwrap();
        assert_eq!(block2.previous_hash, block1.hash);
    }

    #[test]
    fn test_blessed_app_restriction() {
        let mut mux = Mux::new();
        mux.register(Box::new(NoopApp)).unwrap();
        mux.begin_block(&BlockContext { height: 1, time: 1 }).unwrap();
        mux.end_block(&BlockContext { height: 1, time: 1 }).unwrap();

        assert!(matches!(
            mux.query("noop", "peer_filter/admit", &[], 1),
            Err(ConsensusError::NotBlessed)
        ));
        mux.bless("noop");
        assert!(mux.query("noop", "peer_filter/admit", &[], 1).is_ok());
    }
}
