use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("no such transaction, block or round")]
    NotFound,
}

impl ModuleError for IndexerError {
    fn module_name(&self) -> &'static str {
        "indexer"
    }

    fn code(&self) -> u32 {
        match self {
            IndexerError::NotFound => 1,
        }
    }
}
