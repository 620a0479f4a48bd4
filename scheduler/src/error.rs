use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("not enough eligible nodes: need {needed}, have {available}")]
    NotEnoughNodes { needed: usize, available: usize },
    #[error("no such runtime")]
    NoSuchRuntime,
}

impl ModuleError for SchedulerError {
    fn module_name(&self) -> &'static str {
        "scheduler"
    }

    fn code(&self) -> u32 {
        match self {
            SchedulerError::NotEnoughNodes { .. } => 1,
            SchedulerError::NoSuchRuntime => 2,
        }
    }
}
