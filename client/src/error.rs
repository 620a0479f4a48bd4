use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no such transaction, block, round or runtime")]
    NotFound,
    #[error("request was dropped before a result could be delivered")]
    Cancelled,
    #[error("leader transport error: {0}")]
    Transport(String),
}

impl ModuleError for ClientError {
    fn module_name(&self) -> &'static str {
        "client"
    }

    fn code(&self) -> u32 {
        match self {
            ClientError::NotFound => 1,
            ClientError::Cancelled => 2,
            ClientError::Transport(_) => 3,
        }
    }
}
