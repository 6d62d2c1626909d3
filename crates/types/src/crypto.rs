//! Signing keys, verification keys, signatures and the ordered multi-signature.

use crate::hash::hex_bytes;
use crate::party::Party;
use ed25519_dalek::{Signer as _, Verifier as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Ed25519 signing key held by the local node.
#[derive(Clone)]
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut rng),
        }
    }

    /// Derive a key deterministically from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&seed),
        }
    }

    /// The matching verification key.
    pub fn verification_key(&self) -> VerificationKey {
        VerificationKey(self.inner.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }
}

// Manual Debug - never print key material.
impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("verification_key", &self.verification_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 verification key identifying a party.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VerificationKey(#[serde(with = "hex_bytes")] [u8; 32]);

impl VerificationKey {
    /// Wrap raw key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        VerificationKey(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check a signature over `message`.
    ///
    /// Malformed key or signature bytes simply fail verification.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(message, &sig).is_ok()
    }
}

impl std::fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerificationKey({}..)", hex::encode(&self.0[..4]))
    }
}

/// Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "hex_bytes")] [u8; 64]);

impl Signature {
    /// Wrap raw signature bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Signature(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// The all-zero signature, for fixtures.
    pub const fn zero() -> Self {
        Signature([0u8; 64])
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..4]))
    }
}

/// Aggregated multi-signature over a snapshot.
///
/// The aggregate is the in-order concatenation of the per-party signatures,
/// following the fixed party order of the head parameters. Determinism of the
/// order is what makes the aggregate verifiable on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignature(Vec<Signature>);

impl MultiSignature {
    /// Aggregate one signature per party, in the given party order.
    ///
    /// Fails when a party's signature is missing or when the map carries a
    /// signature from a key outside `parties`.
    pub fn aggregate_in_order(
        signatures: &BTreeMap<Party, Signature>,
        parties: &[Party],
    ) -> Result<Self, AggregateError> {
        if signatures.len() > parties.len() {
            return Err(AggregateError::UnknownSignatory);
        }
        let ordered = parties
            .iter()
            .map(|party| {
                signatures
                    .get(party)
                    .copied()
                    .ok_or(AggregateError::MissingSignature { party: *party })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MultiSignature(ordered))
    }

    /// Verify every constituent signature against the party at the same
    /// index in `parties`.
    pub fn verify(&self, message: &[u8], parties: &[Party]) -> bool {
        self.0.len() == parties.len()
            && self
                .0
                .iter()
                .zip(parties)
                .all(|(signature, party)| party.vkey.verify(message, signature))
    }

    /// The constituent signatures, in party order.
    pub fn signatures(&self) -> &[Signature] {
        &self.0
    }
}

/// Failure aggregating per-party signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("missing signature for party {party}")]
    MissingSignature { party: Party },
    #[error("signature from a key outside the head")]
    UnknownSignatory,
}
