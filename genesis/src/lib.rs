//! Genesis document: bootstrap ledger/registry state and the sanity
//! checks that gate applying it.
mod apply;
mod error;
mod types;

pub use apply::{apply_genesis, sanity_check};
pub use error::GenesisError;
pub use types::GenesisDocument;
