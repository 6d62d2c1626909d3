//! Content digests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// A 32-byte SHA-256 content digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The all-zero digest.
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Digest arbitrary bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Hash(hasher.finalize().into())
    }

    /// Wrap an already-computed 32-byte digest.
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Hash(digest)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, HexError> {
        let bytes = hex::decode(hex_str)?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| HexError::WrongLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Hash(digest))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Failure parsing a hex-encoded byte string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexError {
    #[error("invalid hex encoding: {0}")]
    Invalid(#[from] hex::FromHexError),
    #[error("wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash({}..)", hex::encode(&self.0[..4]))
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Hash::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Types with a canonical content digest.
///
/// Digests feed the snapshot signing message, so two honest nodes that hold
/// equal values must produce equal digests.
pub trait Digestible {
    fn digest(&self) -> Hash;
}

/// Hex (de)serialization for fixed-size byte arrays.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("wrong byte-array length"))
    }
}
