//! Cryptographic primitives used by the bridge core.
//!
//! The bridge is deployed against ledgers with different native signature schemes, so both
//! secp256k1 ECDSA and Ed25519 are supported behind closed enums. Verification is a pure
//! predicate over (digest, key, signature); nothing in here touches bridge state.

use std::fmt::Display;

use alloy::primitives::Address;
use anyhow::{Result, anyhow};
use ed25519_dalek::{
    Signature as Ed25519Signature, Signer as _, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};
use k256::ecdsa::{
    Signature as EcdsaSignature, SigningKey as EcdsaSigningKey, VerifyingKey as EcdsaVerifyingKey,
    signature::hazmat::PrehashVerifier,
};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::BridgeError;

/// A public key belonging to a bridge validator, in whichever scheme the validator registered
/// with. Validator identity everywhere else in the bridge is the [`Address`] derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorPublicKey {
    Ecdsa(EcdsaVerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl ValidatorPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<ValidatorPublicKey> {
        match bytes.len() {
            32 => Ok(ValidatorPublicKey::Ed25519(Ed25519VerifyingKey::from_bytes(
                bytes.try_into()?,
            )?)),
            33 | 65 => Ok(ValidatorPublicKey::Ecdsa(
                EcdsaVerifyingKey::from_sec1_bytes(bytes)?,
            )),
            n => Err(anyhow!("invalid public key length: {n}")),
        }
    }

    pub fn from_hex(s: &str) -> Result<ValidatorPublicKey> {
        Self::from_bytes(&hex::decode(s)?)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            ValidatorPublicKey::Ecdsa(key) => key.to_encoded_point(true).as_bytes().to_vec(),
            ValidatorPublicKey::Ed25519(key) => key.to_bytes().to_vec(),
        }
    }

    /// The canonical 20-byte identity of this key, used to key the validator registry.
    pub fn to_address(&self) -> Address {
        let bytes = match self {
            // Remove the first byte before hashing - The first byte specifies the encoding tag.
            ValidatorPublicKey::Ecdsa(key) => {
                key.to_encoded_point(false).as_bytes()[1..].to_owned()
            }
            ValidatorPublicKey::Ed25519(key) => key.to_bytes().to_vec(),
        };
        Address::from_slice(&Keccak256::digest(bytes)[12..32])
    }

    /// Verify `signature` over `digest`. A signature produced under a different scheme than
    /// this key never verifies.
    pub fn verify(
        &self,
        digest: Hash,
        signature: &ValidatorSignature,
    ) -> std::result::Result<(), BridgeError> {
        let valid = match (self, signature) {
            (ValidatorPublicKey::Ecdsa(key), ValidatorSignature::Ecdsa(sig)) => {
                key.verify_prehash(digest.as_bytes(), sig).is_ok()
            }
            (ValidatorPublicKey::Ed25519(key), ValidatorSignature::Ed25519(sig)) => {
                key.verify_strict(digest.as_bytes(), sig).is_ok()
            }
            _ => false,
        };
        if !valid {
            return Err(BridgeError::InvalidSignature);
        }
        Ok(())
    }
}

impl Display for ValidatorPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

/// A signature produced by a validator over a canonical digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorSignature {
    Ecdsa(EcdsaSignature),
    Ed25519(Ed25519Signature),
}

impl ValidatorSignature {
    /// The raw signature bytes. Used for the consumed-signature replay set, so this must be
    /// deterministic for a given signature.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            ValidatorSignature::Ecdsa(sig) => sig.to_bytes().to_vec(),
            ValidatorSignature::Ed25519(sig) => sig.to_bytes().to_vec(),
        }
    }
}

/// The secret key type backing a validator identity. Either signature scheme can be derived
/// from the same 32 bytes.
#[derive(Debug, Clone, Copy)]
pub struct SecretKey {
    bytes: [u8; 32],
}

impl SecretKey {
    /// Generates a random secret key.
    pub fn new() -> Result<SecretKey> {
        Self::new_from_rng(&mut rand::rngs::OsRng)
    }

    pub fn new_from_rng<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Result<SecretKey> {
        let ecdsa = EcdsaSigningKey::random(rng);
        Self::from_bytes(&ecdsa.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<SecretKey> {
        let bytes: [u8; 32] = bytes.try_into()?;

        // Reject scalars that are invalid for secp256k1 up front, so `as_ecdsa` cannot fail
        // later.
        EcdsaSigningKey::from_bytes(&bytes.into()).map_err(|e| anyhow!(e))?;

        Ok(SecretKey { bytes })
    }

    pub fn from_hex(s: &str) -> Result<SecretKey> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    fn as_ecdsa(&self) -> EcdsaSigningKey {
        // Validated on construction, so this cannot fail.
        EcdsaSigningKey::from_bytes(&self.bytes.into()).unwrap()
    }

    fn as_ed25519(&self) -> Ed25519SigningKey {
        Ed25519SigningKey::from_bytes(&self.bytes)
    }

    pub fn ecdsa_public_key(&self) -> ValidatorPublicKey {
        ValidatorPublicKey::Ecdsa(EcdsaVerifyingKey::from(&self.as_ecdsa()))
    }

    pub fn ed25519_public_key(&self) -> ValidatorPublicKey {
        ValidatorPublicKey::Ed25519(self.as_ed25519().verifying_key())
    }

    pub fn sign_ecdsa(&self, digest: Hash) -> ValidatorSignature {
        // `sign_prehash_recoverable` only fails on an empty prehash and the digest is always
        // 32 bytes.
        ValidatorSignature::Ecdsa(
            self.as_ecdsa()
                .sign_prehash_recoverable(digest.as_bytes())
                .unwrap()
                .0,
        )
    }

    pub fn sign_ed25519(&self, digest: Hash) -> ValidatorSignature {
        ValidatorSignature::Ed25519(self.as_ed25519().sign(digest.as_bytes()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0; 32]);

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn compute<T: AsRef<[S]>, S: AsRef<[u8]>>(preimages: T) -> Hash {
        let mut hasher = Keccak256::new();
        for preimage in preimages.as_ref() {
            hasher.update(preimage.as_ref());
        }
        Self(hasher.finalize().into())
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}
