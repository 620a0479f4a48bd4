use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("insufficient escrow balance")]
    InsufficientEscrowBalance,
    #[error("no such account")]
    NoSuchAccount,
    #[error("no such stake claim")]
    NoSuchStakeClaim,
    #[error("forbidden by policy: {0}")]
    Forbidden(String),
}

impl ModuleError for LedgerError {
    fn module_name(&self) -> &'static str {
        "ledger"
    }

    fn code(&self) -> u32 {
        match self {
            LedgerError::InsufficientBalance => 1,
            LedgerError::InsufficientEscrowBalance => 2,
            LedgerError::NoSuchAccount => 3,
            LedgerError::NoSuchStakeClaim => 4,
            LedgerError::Forbidden(_) => 5,
        }
    }
}
