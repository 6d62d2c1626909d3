//! Snapshots: numbered multi-signed agreements on the off-chain ledger state.

use crate::crypto::MultiSignature;
use crate::ledger::IsTx;
use serde::{Deserialize, Serialize};

/// Monotone snapshot sequence number. Number 0 is the initial snapshot a
/// head opens with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SnapshotNumber(pub u64);

impl SnapshotNumber {
    pub const INITIAL: SnapshotNumber = SnapshotNumber(0);

    pub const fn next(self) -> SnapshotNumber {
        SnapshotNumber(self.0 + 1)
    }
}

impl std::fmt::Display for SnapshotNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numbered agreement on a ledger state, together with the transactions
/// applied since the previous snapshot to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Snapshot<T: IsTx> {
    pub number: SnapshotNumber,
    /// Ledger state after applying `confirmed` to the previous snapshot.
    pub utxo: T::UTxO,
    /// Transactions included in this snapshot, in application order.
    pub confirmed: Vec<T>,
}

impl<T: IsTx> Snapshot<T> {
    /// The message every party signs when acknowledging this snapshot.
    pub fn signing_message(&self) -> Vec<u8> {
        crate::signing::snapshot_signing_message(self)
    }
}

/// The most recent agreement carrying enough signatures to be settled on
/// chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ConfirmedSnapshot<T: IsTx> {
    /// The snapshot a head opens with: number 0, the union of all committed
    /// utxo sets, no signatures required.
    Initial { utxo: T::UTxO },
    /// A later snapshot bundled with its aggregated multi-signature.
    Confirmed {
        snapshot: Snapshot<T>,
        signatures: MultiSignature,
    },
}

impl<T: IsTx> ConfirmedSnapshot<T> {
    pub fn initial(utxo: T::UTxO) -> Self {
        ConfirmedSnapshot::Initial { utxo }
    }

    /// Number of the agreed snapshot.
    pub fn number(&self) -> SnapshotNumber {
        match self {
            ConfirmedSnapshot::Initial { .. } => SnapshotNumber::INITIAL,
            ConfirmedSnapshot::Confirmed { snapshot, .. } => snapshot.number,
        }
    }

    /// The agreed ledger state.
    pub fn utxo(&self) -> &T::UTxO {
        match self {
            ConfirmedSnapshot::Initial { utxo } => utxo,
            ConfirmedSnapshot::Confirmed { snapshot, .. } => &snapshot.utxo,
        }
    }

    /// Transactions settled by the agreed snapshot.
    pub fn confirmed_transactions(&self) -> &[T] {
        match self {
            ConfirmedSnapshot::Initial { .. } => &[],
            ConfirmedSnapshot::Confirmed { snapshot, .. } => &snapshot.confirmed,
        }
    }
}
