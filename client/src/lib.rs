//! Per-runtime client watcher: compute-committee leader tracking and
//! transaction submission/correlation, plus the read-only RPC surface
//! over the roothash block history and transaction indexer.
mod error;
mod rpc;
mod state;
mod transport;
mod types;

pub use error::ClientError;
pub use rpc::{ClientRpc, EnclaveRpc, RejectingEnclaveRpc};
pub use state::ClientWatcher;
pub use transport::{LeaderTransport, NullTransport};
pub use types::{Delivery, SubmitResult};
