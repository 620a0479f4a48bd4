use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoothashError {
    #[error("signer is not a member of the current committee in the expected role")]
    NotCommitteeMember,
    #[error("signer has already submitted a commitment this round")]
    DuplicateCommitment,
    #[error("commitment's previous_hash does not match the current block header")]
    StaleCommitment,
    #[error("round is not accepting commitments in its current state")]
    WrongState,
}

impl ModuleError for RoothashError {
    fn module_name(&self) -> &'static str {
        "roothash"
    }

    fn code(&self) -> u32 {
        match self {
            RoothashError::NotCommitteeMember => 1,
            RoothashError::DuplicateCommitment => 2,
            RoothashError::StaleCommitment => 3,
            RoothashError::WrongState => 4,
        }
    }
}
