use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no value for the requested key")]
    NotFound,
}

impl ModuleError for StorageError {
    fn module_name(&self) -> &'static str {
        "storage"
    }

    fn code(&self) -> u32 {
        match self {
            StorageError::NotFound => 1,
        }
    }
}
