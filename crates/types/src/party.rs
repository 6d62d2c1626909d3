//! Protocol participants.

use crate::crypto::VerificationKey;
use serde::{Deserialize, Serialize};

/// A head member, identified by its verification key.
///
/// Parties order by key bytes, which keeps signature maps and pending-commit
/// sets deterministic across nodes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Key the party acknowledges snapshots with.
    pub vkey: VerificationKey,
}

impl Party {
    pub const fn new(vkey: VerificationKey) -> Self {
        Party { vkey }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.vkey)
    }
}

impl std::fmt::Debug for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Party({})", self.vkey)
    }
}

/// Transport-level identifier of a peer.
///
/// Only used in connectivity notifications; protocol messages identify their
/// sender by [`Party`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
