//! Genesis sanity checking and application.
//!
//! Grounded on spec.md §4.10/§7's genesis sanity-check taxonomy and the
//! Design Notes' framing of the genesis digest as a value computed once at
//! `InitChain`; no single teacher file owns this (the ekiden-era pack has
//! no genesis subsystem at all), so the ordering below — ledger seed,
//! entity, runtime, node, then digest — follows spec.md §4.10 directly.
use oasis_core_common::{crypto::Hash, EPOCH_INVALID};
use oasis_core_ledger::Ledger;
use oasis_core_registry::{Registry, RUNTIME_SIGNATURE_CONTEXT};
use oasis_core_storage::{verify_receipt, ReceiptBody};

use crate::{error::GenesisError, types::GenesisDocument};

/// Rejects a malformed genesis document before any state mutation is
/// attempted. Each rejection names a specific, stable reason (spec.md §7).
pub fn sanity_check(doc: &GenesisDocument) -> Result<(), GenesisError> {
    if doc.epoch_interval <= 0 && !doc.debug_allow_zero_epoch_interval {
        return Err(GenesisError::InvalidEpochInterval);
    }
    if doc.base_epoch == EPOCH_INVALID {
        return Err(GenesisError::InvalidBaseEpoch);
    }
    if (doc.debug_allow_zero_epoch_interval || doc.debug_bypass_stake) && !doc.debug_mode {
        return Err(GenesisError::UnsafeDebugFlag);
    }

    for signed_runtime in &doc.runtimes {
        let runtime = match signed_runtime.open(RUNTIME_SIGNATURE_CONTEXT) {
            Ok(runtime) => runtime,
            // An invalid signature here is a registration-time failure, not
            // a sanity-check failure; `apply_genesis` surfaces it when it
            // calls `register_runtime`.
            Err(_) => continue,
        };
        let genesis = &runtime.genesis;
        if genesis.state_present || genesis.state_root == Hash::empty_hash() {
            continue;
        }
        let body = ReceiptBody {
            state_root: genesis.state_root,
            keys: Vec::new(),
        };
        let has_valid_receipt = genesis.storage_receipts.iter().any(|receipt| verify_receipt(receipt, &body));
        if !has_valid_receipt {
            return Err(GenesisError::MissingStorageReceipt {
                runtime: format!("{:?}", runtime.id),
            });
        }
    }

    Ok(())
}

/// Apply a sanity-checked genesis document: seed ledger accounts, then
/// register entities, runtimes and nodes in that order, then compute and
/// return the genesis digest for later chain-id comparison.
///
/// Each `register_*` call performs its own envelope-signature
/// verification; this function does not re-verify beforehand, so every
/// envelope is checked exactly once.
pub fn apply_genesis(doc: &GenesisDocument, registry: &mut Registry, ledger: &mut Ledger) -> Result<Hash, GenesisError> {
    sanity_check(doc)?;

    for (owner, account) in &doc.ledger_accounts {
        ledger.set_account(*owner, account.clone());
    }
    for signed_entity in &doc.entities {
        registry.register_entity(signed_entity)?;
    }
    for signed_runtime in &doc.runtimes {
        registry.register_runtime(signed_runtime)?;
    }
    for multi_signed_node in &doc.nodes {
        registry.register_node(multi_signed_node, ledger, doc.base_epoch)?;
    }

    Ok(Hash::digest_bytes(&oasis_core_common::cbor::to_vec(doc)))
}

#[cfg(test)]
mod test {
    use super::*;
    use oasis_core_common::{MemorySigner, Signed};
    use oasis_core_registry::types::{Entity, StakeThresholds};

    fn make_registry() -> Registry {
        Registry::new(StakeThresholds::default(), true)
    }

    #[test]
    fn test_sanity_check_rejects_zero_epoch_interval_without_debug_flag() {
        let doc = GenesisDocument {
            epoch_interval: 0,
            ..GenesisDocument::default()
        };
        assert!(matches!(sanity_check(&doc), Err(GenesisError::InvalidEpochInterval)));
    }

    #[test]
    fn test_sanity_check_rejects_unguarded_debug_flag() {
        let doc = GenesisDocument {
            debug_allow_zero_epoch_interval: true,
            debug_mode: false,
            epoch_interval: 0,
            ..GenesisDocument::default()
        };
        assert!(matches!(sanity_check(&doc), Err(GenesisError::UnsafeDebugFlag)));
    }

    #[test]
    fn test_sanity_check_accepts_guarded_debug_flag() {
        let doc = GenesisDocument {
            debug_allow_zero_epoch_interval: true,
            debug_mode: true,
            epoch_interval: 0,
            ..GenesisDocument::default()
        };
        assert!(sanity_check(&doc).is_ok());
    }

    #[test]
    fn test_apply_genesis_registers_entity_and_seeds_ledger() {
        let signer = MemorySigner::from_seed(&[9u8; 32]);
        let entity = Entity {
            id: signer.public_key(),
            allow_entity_signed_nodes: true,
        };
        let signed_entity = Signed::sign(&signer, oasis_core_registry::ENTITY_SIGNATURE_CONTEXT, &entity);

        let doc = GenesisDocument {
            entities: vec![signed_entity],
            ..GenesisDocument::default()
        };

        let mut registry = make_registry();
        let mut ledger = Ledger::new();
        let digest = apply_genesis(&doc, &mut registry, &mut ledger).unwrap();

        assert!(registry.get_entity(&signer.public_key()).is_some());
        assert_ne!(digest, Hash::empty_hash());
    }
}
