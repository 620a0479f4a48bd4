//! Per-runtime round state machine: commitment acceptance, fast and
//! backup-path finalization, round failure and block history.
pub mod broker;
mod error;
mod state;
pub mod types;

pub use broker::{BlockBroker, BlockWatch};
pub use error::RoothashError;
pub use state::{Round, RoundEvent, RoundState};
