use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("malformed request: {0}")]
    InvalidArgument(String),
    #[error("no such application: {0}")]
    NoSuchApp(String),
    #[error("no such method: {0}")]
    MethodNotSupported(String),
    #[error("only the blessed application may answer peer-filter queries")]
    NotBlessed,
    #[error("chain has no committed blocks yet")]
    NoCommittedBlocks,
    #[error("no block at the requested height")]
    NoSuchBlock,
    #[error("application dependency {0} is not registered")]
    MissingDependency(&'static str),
    #[error("application {0} is already registered")]
    DuplicateApp(&'static str),
}

impl ModuleError for ConsensusError {
    fn module_name(&self) -> &'static str {
        "consensus"
    }

    fn code(&self) -> u32 {
        match self {
            ConsensusError::InvalidArgument(_) => 1,
            ConsensusError::NoSuchApp(_) => 2,
            ConsensusError::MethodNotSupported(_) => 3,
            ConsensusError::NotBlessed => 4,
            ConsensusError::NoCommittedBlocks => 5,
            ConsensusError::NoSuchBlock => 6,
            ConsensusError::MissingDependency(_) => 7,
            ConsensusError::DuplicateApp(_) => 8,
        }
    }
}
