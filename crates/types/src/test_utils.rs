//! Deterministic test fixtures.
//!
//! Everything here derives from small integer seeds so tests are fully
//! reproducible without randomness.

use crate::chain::IsChainState;
use crate::crypto::SigningKey;
use crate::hash::{Digestible, Hash};
use crate::ledger::{IsTx, Ledger, UTxOSet, ValidationError};
use crate::party::Party;
use crate::time::ChainSlot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Signing key derived from a single seed byte.
pub fn test_signing_key(seed: u8) -> SigningKey {
    SigningKey::from_seed([seed; 32])
}

/// Party whose key derives from `seed`.
pub fn test_party(seed: u8) -> Party {
    Party::new(test_signing_key(seed).verification_key())
}

/// A transaction for the mock ledger: consumes `inputs`, produces `outputs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MockTx {
    pub id: u64,
    pub inputs: BTreeSet<u64>,
    pub outputs: BTreeSet<u64>,
}

impl MockTx {
    pub fn new(
        id: u64,
        inputs: impl IntoIterator<Item = u64>,
        outputs: impl IntoIterator<Item = u64>,
    ) -> Self {
        MockTx {
            id,
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }
}

impl Digestible for MockTx {
    fn digest(&self) -> Hash {
        let mut bytes = Vec::with_capacity(8 * (1 + self.inputs.len() + self.outputs.len()));
        bytes.extend_from_slice(&self.id.to_le_bytes());
        for input in &self.inputs {
            bytes.extend_from_slice(&input.to_le_bytes());
        }
        for output in &self.outputs {
            bytes.extend_from_slice(&output.to_le_bytes());
        }
        Hash::from_bytes(&bytes)
    }
}

impl IsTx for MockTx {
    type UTxO = MockUTxO;
}

/// Mock utxo set: plain output references.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MockUTxO(pub BTreeSet<u64>);

impl MockUTxO {
    pub fn of(refs: impl IntoIterator<Item = u64>) -> Self {
        MockUTxO(refs.into_iter().collect())
    }
}

impl Digestible for MockUTxO {
    fn digest(&self) -> Hash {
        let mut bytes = Vec::with_capacity(8 * self.0.len());
        for output in &self.0 {
            bytes.extend_from_slice(&output.to_le_bytes());
        }
        Hash::from_bytes(&bytes)
    }
}

impl UTxOSet for MockUTxO {
    fn merge(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

/// Chain state carrying nothing but a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MockChainState {
    pub slot: ChainSlot,
}

impl MockChainState {
    pub fn at(slot: u64) -> Self {
        MockChainState {
            slot: ChainSlot(slot),
        }
    }
}

impl IsChainState for MockChainState {
    fn slot(&self) -> ChainSlot {
        self.slot
    }
}

/// Mock ledger: a transaction applies when all of its inputs are unspent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockLedger;

impl Ledger<MockTx> for MockLedger {
    fn can_apply(&self, utxo: &MockUTxO, tx: &MockTx) -> Result<(), ValidationError> {
        match tx.inputs.iter().find(|input| !utxo.0.contains(input)) {
            None => Ok(()),
            Some(missing) => Err(ValidationError::new(format!(
                "tx {} spends unknown output {missing}",
                tx.id
            ))),
        }
    }

    fn apply_transactions(
        &self,
        utxo: MockUTxO,
        txs: &[MockTx],
    ) -> Result<MockUTxO, ValidationError> {
        let mut current = utxo;
        for tx in txs {
            self.can_apply(&current, tx)?;
            current.0.retain(|output| !tx.inputs.contains(output));
            current.0.extend(tx.outputs.iter().copied());
        }
        Ok(current)
    }
}
