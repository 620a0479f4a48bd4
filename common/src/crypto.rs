//! Signed envelopes and content hashing.
//!
//! Grounded on the teacher's `common/src/signature.rs` (`Signer`,
//! `Signature::sign`/`verify` over `digest(context, value)`, `Signed<T>`)
//! generalized to (a) Ed25519 via `ed25519-dalek` instead of `ring`, and
//! (b) an ordered multi-signature envelope for `MultiSignedNode`.
use std::{convert::TryFrom, marker::PhantomData};

use ed25519_dalek::{Keypair, Signer as DalekSigner, Verifier as DalekVerifier};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha512Trunc256};

use crate::cbor;

crate::fixed_bytes_type!(PublicKey, 32);
crate::fixed_bytes_type!(Signature, 64);
crate::fixed_bytes_type!(Hash, 32);

impl Hash {
    /// SHA-512/256 digest of an already-encoded byte string.
    pub fn digest_bytes(data: &[u8]) -> Hash {
        let mut hasher = Sha512Trunc256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        Hash::try_from(digest.as_slice()).expect("sha512/256 output is 32 bytes")
    }

    /// Canonical hash of the empty byte string, used for "no value present".
    pub fn empty_hash() -> Hash {
        Hash::digest_bytes(&[])
    }
}

/// Domain-separation context for a signed message. Every signature opens
/// over `context || blob`, so contexts from different message kinds can
/// never be confused with one another.
pub type Context = &'static [u8];

/// Capability to produce Ed25519 signatures.
pub trait Signer: Sync + Send {
    fn sign(&self, context: Context, message: &[u8]) -> Signature;
    fn public_key(&self) -> PublicKey;
}

/// In-memory signer backed by an Ed25519 keypair. Used by tests, genesis
/// tooling and the committee node loop's self-signed re-registration.
pub struct MemorySigner {
    keypair: Keypair,
}

impl MemorySigner {
    pub fn generate<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Self {
        MemorySigner {
            keypair: Keypair::generate(rng),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let secret = ed25519_dalek::SecretKey::from_bytes(seed).expect("valid seed");
        let public = ed25519_dalek::PublicKey::from(&secret);
        MemorySigner {
            keypair: Keypair { secret, public },
        }
    }
}

impl Signer for MemorySigner {
    fn sign(&self, context: Context, message: &[u8]) -> Signature {
        let digest = digest_with_context(context, message);
        let sig = self.keypair.sign(&digest);
        Signature::try_from(sig.to_bytes().as_ref()).unwrap()
    }

    fn public_key(&self) -> PublicKey {
        PublicKey::try_from(self.keypair.public.to_bytes().as_ref()).unwrap()
    }
}

fn digest_with_context(context: Context, message: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(context.len() + message.len());
    buf.extend_from_slice(context);
    buf.extend_from_slice(message);
    buf
}

/// Verify a detached signature over `(context, message)` for `public_key`.
pub fn verify(public_key: &PublicKey, context: Context, message: &[u8], signature: &Signature) -> bool {
    let pk = match ed25519_dalek::PublicKey::from_bytes(public_key.as_bytes()) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    let sig = match ed25519_dalek::Signature::try_from(signature.as_bytes().as_ref()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let digest = digest_with_context(context, message);
    pk.verify(&digest, &sig).is_ok()
}

/// A single public-key/signature pair, as carried inside signed envelopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct SignatureBundle {
    pub public_key: PublicKey,
    pub signature: Signature,
}

/// A value carried alongside one signature opening over its canonical
/// encoding. Mirrors the teacher's `Signed<T>`: the raw encoded bytes are
/// kept "untrusted" until `open` has verified the signature.
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct Signed<T> {
    #[serde(with = "serde_bytes")]
    untrusted_raw_value: Vec<u8>,
    #[serde(skip)]
    marker: PhantomData<T>,
    pub signature: SignatureBundle,
}

impl<T> Signed<T> {
    pub fn sign<S: Signer + ?Sized>(signer: &S, context: Context, value: &T) -> Self
    where
        T: Serialize,
    {
        let untrusted_raw_value = cbor::to_vec(value);
        let signature = SignatureBundle {
            public_key: signer.public_key(),
            signature: signer.sign(context, &untrusted_raw_value),
        };
        Signed {
            untrusted_raw_value,
            marker: PhantomData,
            signature,
        }
    }

    /// Verify the signature and return the decoded value.
    pub fn open(&self, context: Context) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        if !verify(
            &self.signature.public_key,
            context,
            &self.untrusted_raw_value,
            &self.signature.signature,
        ) {
            anyhow::bail!("invalid signature");
        }
        self.unverified_value()
    }

    /// Decode without verifying. Callers must have verified the signature
    /// through some other path (e.g. as part of a multi-signed envelope).
    pub fn unverified_value(&self) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        cbor::from_slice(&self.untrusted_raw_value)
    }

    pub fn signer(&self) -> PublicKey {
        self.signature.public_key
    }
}

impl<T: Clone> Clone for Signed<T> {
    fn clone(&self) -> Self {
        Signed {
            untrusted_raw_value: self.untrusted_raw_value.clone(),
            marker: PhantomData,
            signature: self.signature.clone(),
        }
    }
}

/// A value co-signed by an ordered, unique-by-signer set of signatures —
/// used for `MultiSignedNode` where the node, its p2p/consensus/committee
/// keys and its owning entity must each sign the same descriptor.
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct MultiSigned<T> {
    #[serde(with = "serde_bytes")]
    untrusted_raw_value: Vec<u8>,
    #[serde(skip)]
    marker: PhantomData<T>,
    pub signatures: Vec<SignatureBundle>,
}

impl<T> MultiSigned<T> {
    pub fn sign<S: Signer + ?Sized>(signers: &[&S], context: Context, value: &T) -> Self
    where
        T: Serialize,
    {
        let untrusted_raw_value = cbor::to_vec(value);
        let signatures = signers
            .iter()
            .map(|signer| SignatureBundle {
                public_key: signer.public_key(),
                signature: signer.sign(context, &untrusted_raw_value),
            })
            .collect();
        MultiSigned {
            untrusted_raw_value,
            marker: PhantomData,
            signatures,
        }
    }

    /// Verify every signature independently and reject duplicate signers.
    /// Returns the set of signer public keys alongside the decoded value.
    pub fn open(&self, context: Context) -> anyhow::Result<(T, Vec<PublicKey>)>
    where
        T: DeserializeOwned,
    {
        if self.signatures.is_empty() {
            anyhow::bail!("no signatures present");
        }

        let mut seen = std::collections::HashSet::new();
        for bundle in &self.signatures {
            if !seen.insert(bundle.public_key) {
                anyhow::bail!("duplicate signer {:?}", bundle.public_key);
            }
            if !verify(
                &bundle.public_key,
                context,
                &self.untrusted_raw_value,
                &bundle.signature,
            ) {
                anyhow::bail!("invalid signature from {:?}", bundle.public_key);
            }
        }

        let value = cbor::from_slice(&self.untrusted_raw_value)?;
        Ok((value, self.signatures.iter().map(|b| b.public_key).collect()))
    }
}

impl<T: Clone> Clone for MultiSigned<T> {
    fn clone(&self) -> Self {
        MultiSigned {
            untrusted_raw_value: self.untrusted_raw_value.clone(),
            marker: PhantomData,
            signatures: self.signatures.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        value: u64,
    }

    fn signer(seed: u8) -> MemorySigner {
        MemorySigner::from_seed(&[seed; 32])
    }

    #[test]
    fn test_signed_roundtrip() {
        let s = signer(1);
        let payload = Payload { value: 42 };
        let signed = Signed::sign(&s, b"test: payload", &payload);
        let opened: Payload = signed.open(b"test: payload").unwrap();
        assert_eq!(opened, payload);
        assert!(signed.open(b"test: other-context").is_err());
    }

    #[test]
    fn test_multi_signed_rejects_duplicate_signer() {
        let s1 = signer(1);
        let payload = Payload { value: 7 };
        let mut multi = MultiSigned::sign(&[&s1], b"test: multi", &payload);
        let dup = multi.signatures[0].clone();
        multi.signatures.push(dup);
        assert!(multi.open(b"test: multi").is_err());
    }

    #[test]
    fn test_multi_signed_verifies_each_signature() {
        let s1 = signer(1);
        let s2 = signer(2);
        let payload = Payload { value: 7 };
        let multi = MultiSigned::sign(&[&s1, &s2], b"test: multi", &payload);
        let (value, signers) = multi.open(b"test: multi").unwrap();
        assert_eq!(value, payload);
        assert_eq!(signers.len(), 2);
    }

    #[test]
    fn test_hash_stable() {
        assert_eq!(Hash::empty_hash(), Hash::digest_bytes(&[]));
        assert_ne!(Hash::digest_bytes(b"a"), Hash::digest_bytes(b"b"));
    }
}
