//! Consensus adapter: the `ConsensusApp` dispatch boundary every
//! application (staking, registry, roothash) plugs into, and the
//! `Consensus` read/write surface the rest of the core depends on instead
//! of talking to a BFT engine directly.
pub mod adapter;
pub mod app;
mod error;
pub mod mux;
pub mod reindex;
pub mod types;

pub use adapter::{Consensus, EventWatch, ImmutableState, InMemoryConsensus};
pub use app::{BlockContext, ConsensusApp};
pub use error::ConsensusError;
pub use mux::Mux;
