//! Per-runtime committee node loop: batching, execution, discrepancy
//! recovery, storage upload and registry re-registration.
pub mod batcher;
mod error;
pub mod host;
mod role;
mod retry;
mod state;
mod types;

pub use batcher::{Batcher, BatcherLimits};
pub use error::NodeError;
pub use host::{Batch, BatchResult, EchoRuntimeHost, HostError, RoundContext, RuntimeHost};
pub use retry::Backoff;
pub use role::{memberships, NodeRole};
pub use state::CommitteeNode;
pub use types::{ScheduledBatch, TXN_SCHEDULER_COMMITMENT_CONTEXT};
