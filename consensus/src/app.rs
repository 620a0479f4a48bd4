//! `ConsensusApp`: the interface every application (staking, registry,
//! roothash) presents to the [`crate::mux::Mux`].
//!
//! Modeled abstractly on the teacher's ABCI multiplexer (out of scope for
//! this pack, since the real BFT engine is excluded per the system's
//! non-goals) as a trait with a single dispatcher that routes by method
//! name and honors dependency ordering — see the Design Notes' "ABCI
//! multiplexer" mapping.
use crate::{error::ConsensusError, types::Event};

/// Per-block context handed to every hook. `begin_block` and `end_block`
/// run once per height; `execute_tx` runs once per transaction within that
/// height, always on the same thread, and must not suspend once it has
/// issued a state write (registry/roothash mutations are synchronous).
#[derive(Clone, Copy, Debug)]
pub struct BlockContext {
    pub height: i64,
    pub time: u64,
}

pub trait ConsensusApp: Send {
    /// Unique application name, used as the method prefix (`"registry.RegisterEntity"`)
    /// and as the app argument to [`crate::mux::Mux::query`].
    fn name(&self) -> &'static str;

    /// Other apps that must already be registered before this one. The mux
    /// rejects registration out of order rather than silently reordering.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Method names this app accepts in `execute_tx`, advertised so the mux
    /// can reject unknown methods without invoking the app.
    fn methods(&self) -> &'static [&'static str];

    /// Called once, in registration order, after every dependency is present.
    fn on_register(&mut self) {}

    fn begin_block(&mut self, ctx: &BlockContext) -> Result<(), ConsensusError> {
        let _ = ctx;
        Ok(())
    }

    /// Execute one transaction's method body. Any `Err` aborts this
    /// transaction's state mutations atomically; it never poisons the block.
    fn execute_tx(&mut self, ctx: &BlockContext, method: &str, body: &[u8]) -> Result<Vec<u8>, ConsensusError>;

    /// Drain end-of-block events (e.g. `nodes_expired`, `finalized`).
    fn end_block(&mut self, ctx: &BlockContext) -> Result<Vec<Event>, ConsensusError> {
        let _ = ctx;
        Ok(Vec::new())
    }

    /// Answer a read-only query at a historical height. `path` is app-defined.
    fn query(&self, path: &str, payload: &[u8], height: i64) -> Result<Vec<u8>, ConsensusError> {
        let _ = (payload, height);
        Err(ConsensusError::MethodNotSupported(path.to_string()))
    }
}
