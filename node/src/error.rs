use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node does not hold the required committee role for this action")]
    WrongRole,
    #[error("no pending batch for round {0}")]
    NoPendingBatch(u64),
    #[error("node is not currently tracking an in-flight round")]
    NoActiveRound,
    #[error("runtime host error: {0}")]
    Host(#[from] crate::host::HostError),
    #[error("round state error: {0}")]
    Round(#[from] oasis_core_roothash::RoothashError),
}

impl ModuleError for NodeError {
    fn module_name(&self) -> &'static str {
        "node"
    }

    fn code(&self) -> u32 {
        match self {
            NodeError::WrongRole => 1,
            NodeError::NoPendingBatch(_) => 2,
            NodeError::NoActiveRound => 3,
            NodeError::Host(_) => 4,
            NodeError::Round(_) => 5,
        }
    }
}
