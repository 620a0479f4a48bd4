use oasis_core_common::error::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no such entity")]
    NoSuchEntity,
    #[error("no such node")]
    NoSuchNode,
    #[error("no such runtime")]
    NoSuchRuntime,
    #[error("entity already registered")]
    EntityAlreadyRegistered,
    #[error("runtime already registered")]
    RuntimeAlreadyRegistered,
    #[error("node owner does not allow entity-signed node registration")]
    EntitySignedNodesNotAllowed,
    #[error("node registration is missing the entity signature")]
    MissingEntitySignature,
    #[error("node registration carries an undefined role bit")]
    InvalidRoles,
    #[error("node registers for an unregistered runtime {0:?}")]
    UnknownRuntime(oasis_core_common::Namespace),
    #[error("node claims a role requiring a reachable committee address without one")]
    MissingCommitteeAddress,
    #[error("re-registration may not change a node's runtime set")]
    RuntimeSetImmutable,
    #[error("node is frozen until epoch {0}")]
    NodeFrozen(u64),
    #[error("only the owning entity may unfreeze a node")]
    NotNodeOwner,
    #[error("insufficient stake: need {needed}, have {available}")]
    InsufficientStake { needed: u128, available: u128 },
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("TEE attestation verification failed for runtime {0:?}")]
    TeeVerificationFailed(oasis_core_common::Namespace),
    #[error("entity is not admitted by runtime {0:?}'s admission policy")]
    AdmissionDenied(oasis_core_common::Namespace),
}

impl ModuleError for RegistryError {
    fn module_name(&self) -> &'static str {
        "registry"
    }

    fn code(&self) -> u32 {
        match self {
            RegistryError::NoSuchEntity => 1,
            RegistryError::NoSuchNode => 2,
            RegistryError::NoSuchRuntime => 3,
            RegistryError::EntityAlreadyRegistered => 4,
            RegistryError::RuntimeAlreadyRegistered => 5,
            RegistryError::EntitySignedNodesNotAllowed => 6,
            RegistryError::MissingEntitySignature => 7,
            RegistryError::InvalidRoles => 8,
            RegistryError::UnknownRuntime(_) => 9,
            RegistryError::MissingCommitteeAddress => 10,
            RegistryError::RuntimeSetImmutable => 11,
            RegistryError::NodeFrozen(_) => 12,
            RegistryError::NotNodeOwner => 13,
            RegistryError::InsufficientStake { .. } => 14,
            RegistryError::InvalidSignature => 15,
            RegistryError::InvalidArgument(_) => 16,
            RegistryError::TeeVerificationFailed(_) => 17,
            RegistryError::AdmissionDenied(_) => 18,
        }
    }
}
