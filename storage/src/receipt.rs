//! Storage receipts: a storage node's signed attestation that it holds a
//! given set of keys under a given state root.
//!
//! Grounded on the Design Notes' "Storage receipt verification is a
//! content-addressed check over `(state_root, keys)` tuples; signatures
//! are independent of the roothash state machine but must be validated
//! before a header is accepted as canonical during genesis/import" —
//! this crate owns that check since no teacher file implements receipts
//! (the ekiden-era `storage/base` predates them).
use serde::{Deserialize, Serialize};

use oasis_core_common::{
    cbor,
    crypto::{self, Hash},
    Signer,
};
pub use oasis_core_common::SignatureBundle as StorageReceipt;

pub const RECEIPT_SIGNATURE_CONTEXT: &[u8] = b"oasis-core/storage: receipt";

/// What a receipt actually attests to: every key is retrievable and
/// together they are consistent with `state_root`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptBody {
    pub state_root: Hash,
    pub keys: Vec<Hash>,
}

/// Sign a receipt over `body` as the given storage node.
pub fn sign_receipt<S: Signer + ?Sized>(signer: &S, body: &ReceiptBody) -> StorageReceipt {
    let encoded = cbor::to_vec(body);
    StorageReceipt {
        public_key: signer.public_key(),
        signature: signer.sign(RECEIPT_SIGNATURE_CONTEXT, &encoded),
    }
}

/// Verify that `receipt` attests to exactly `body`, over the signer it
/// names. Used before accepting a genesis runtime state or an imported
/// header as canonical.
pub fn verify_receipt(receipt: &StorageReceipt, body: &ReceiptBody) -> bool {
    let encoded = cbor::to_vec(body);
    crypto::verify(&receipt.public_key, RECEIPT_SIGNATURE_CONTEXT, &encoded, &receipt.signature)
}

#[cfg(test)]
mod test {
    use super::*;
    use oasis_core_common::MemorySigner;

    #[test]
    fn test_receipt_round_trips() {
        let signer = MemorySigner::from_seed(&[3u8; 32]);
        let body = ReceiptBody {
            state_root: Hash::digest_bytes(b"root"),
            keys: vec![Hash::digest_bytes(b"a"), Hash::digest_bytes(b"b")],
        };
        let receipt = sign_receipt(&signer, &body);
        assert!(verify_receipt(&receipt, &body));
    }

    #[test]
    fn test_receipt_rejects_mismatched_body() {
        let signer = MemorySigner::from_seed(&[4u8; 32]);
        let body = ReceiptBody {
            state_root: Hash::digest_bytes(b"root"),
            keys: vec![Hash::digest_bytes(b"a")],
        };
        let receipt = sign_receipt(&signer, &body);
        let other = ReceiptBody {
            state_root: Hash::digest_bytes(b"different"),
            keys: body.keys.clone(),
        };
        assert!(!verify_receipt(&receipt, &other));
    }
}
