//! Primitives shared by every component of the core: canonical encoding,
//! hashing, signed envelopes, identifiers, quantities and the replay-last
//! broker used by committee/block subscriptions.
#[macro_use]
extern crate slog;

pub mod broker;
pub mod cbor;
pub mod crypto;
pub mod error;
pub mod identifiers;
pub mod logger;
pub mod quantity;

pub use crate::{
    crypto::{MemorySigner, MultiSigned, PublicKey, Signature, SignatureBundle, Signed, Signer},
    identifiers::{EpochTime, Namespace, Round, EPOCH_INVALID},
    quantity::Quantity,
};
