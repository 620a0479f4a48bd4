//! The out-of-scope TEE quote-verification boundary (spec.md §1 excludes
//! attestation cryptography; the core only "consumes a `Tee::verify(now)`
//! primitive"). `register_node` calls through this trait whenever a
//! node's declared capabilities include a TEE capability.
use oasis_core_common::EpochTime;

use crate::types::CapabilityTEE;

pub trait Tee: Send + Sync {
    fn verify(&self, capability: &CapabilityTEE, now: EpochTime) -> bool;
}

/// Accepts every attestation unchecked, standing in for quote verification
/// in tests and single-node deployments.
pub struct AcceptAllTee;

impl Tee for AcceptAllTee {
    fn verify(&self, _capability: &CapabilityTEE, _now: EpochTime) -> bool {
        true
    }
}

/// Rejects every attestation, useful for exercising the registration
/// failure path without a real verifier.
pub struct RejectAllTee;

impl Tee for RejectAllTee {
    fn verify(&self, _capability: &CapabilityTEE, _now: EpochTime) -> bool {
        false
    }
}
