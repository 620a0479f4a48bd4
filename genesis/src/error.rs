use oasis_core_common::error::ModuleError;
use oasis_core_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("epoch_interval must be positive unless debug_allow_zero_epoch_interval is set")]
    InvalidEpochInterval,
    #[error("base_epoch is not representable")]
    InvalidBaseEpoch,
    #[error("runtime {runtime} genesis has empty state and no valid storage receipt for its state root")]
    MissingStorageReceipt { runtime: String },
    #[error("a debug_* flag is set without debug_mode")]
    UnsafeDebugFlag,
    #[error("applying genesis registration failed: {0}")]
    Registration(#[from] RegistryError),
}

impl ModuleError for GenesisError {
    fn module_name(&self) -> &'static str {
        "genesis"
    }

    fn code(&self) -> u32 {
        match self {
            GenesisError::InvalidEpochInterval => 1,
            GenesisError::InvalidBaseEpoch => 2,
            GenesisError::MissingStorageReceipt { .. } => 3,
            GenesisError::UnsafeDebugFlag => 4,
            GenesisError::Registration(_) => 5,
        }
    }
}
