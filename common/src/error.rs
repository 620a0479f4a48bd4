//! Shared error taxonomy plumbing.
//!
//! Grounded on the teacher's `runtime/Cargo.toml` choice of `thiserror` for
//! typed, propagatable errors (the old `ekiden`-era hand-rolled
//! `Error`/`Result` pair in `common/src/signature.rs` is not carried
//! forward). Every per-component error enum additionally implements
//! [`ModuleError`] so that errors can cross component boundaries (e.g. a
//! registry error surfacing through a consensus-app dispatch) while
//! keeping a stable `(module, code)` pair for clients.
use thiserror::Error;

/// A module-qualified, numerically stable error code. Never renumber an
/// existing variant — clients may match on `(module, code)`.
pub trait ModuleError: std::error::Error {
    fn module_name(&self) -> &'static str;
    fn code(&self) -> u32;
}

/// Errors that can occur while opening a signed or multi-signed envelope,
/// shared by every component that accepts one.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed payload: {0}")]
    InvalidArgument(String),
}

impl ModuleError for EnvelopeError {
    fn module_name(&self) -> &'static str {
        "envelope"
    }

    fn code(&self) -> u32 {
        match self {
            EnvelopeError::InvalidSignature => 1,
            EnvelopeError::InvalidArgument(_) => 2,
        }
    }
}
