//! Ledger capability: how the head validates and applies transactions.
//!
//! The head logic never executes transactions itself. It is generic over a
//! transaction type family and consults a [`Ledger`] value, passed into
//! every transition call, for validity and application.

use crate::hash::Digestible;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transaction type family of a head.
///
/// The bounds cover everything the protocol needs from a transaction: value
/// semantics for the seen-transaction queue, a content digest for the
/// snapshot signing message, and serialization for the wire.
pub trait IsTx:
    Clone + Eq + std::fmt::Debug + Digestible + Serialize + DeserializeOwned + 'static
{
    /// The ledger state type this transaction operates on.
    type UTxO: UTxOSet;
}

/// A set of unspent transaction outputs.
///
/// `Default` is the empty set; [`UTxOSet::merge`] the union. Folding the
/// committed sets of all parties with `merge` yields the opening utxo of a
/// head.
pub trait UTxOSet:
    Clone + Eq + std::fmt::Debug + Default + Digestible + Serialize + DeserializeOwned + 'static
{
    /// Union of two utxo sets.
    fn merge(self, other: Self) -> Self;
}

/// Union of any number of utxo sets.
pub fn merge_utxo<U: UTxOSet>(sets: impl IntoIterator<Item = U>) -> U {
    sets.into_iter().fold(U::default(), U::merge)
}

/// Validation failure reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        ValidationError {
            reason: reason.into(),
        }
    }
}

/// Ledger capability injected into the transition function.
pub trait Ledger<T: IsTx> {
    /// Check whether `tx` could be applied to `utxo`.
    fn can_apply(&self, utxo: &T::UTxO, tx: &T) -> Result<(), ValidationError>;

    /// Apply `txs` in order, returning the resulting utxo set.
    fn apply_transactions(&self, utxo: T::UTxO, txs: &[T]) -> Result<T::UTxO, ValidationError>;
}
