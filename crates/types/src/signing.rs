//! Signing-message construction with domain separation.
//!
//! Centralizing the byte layout here keeps signers and verifiers in exact
//! agreement on what an acknowledgement signature covers.

use crate::hash::Digestible;
use crate::ledger::IsTx;
use crate::snapshot::Snapshot;

/// Domain tag for snapshot acknowledgement signatures.
pub const DOMAIN_SNAPSHOT: &[u8] = b"snapshot:";

/// The message a party signs when acknowledging a snapshot.
///
/// Binds the domain tag, the snapshot number, the digest of the resulting
/// utxo set, and the digest of every included transaction in order.
pub fn snapshot_signing_message<T: IsTx>(snapshot: &Snapshot<T>) -> Vec<u8> {
    let mut message =
        Vec::with_capacity(DOMAIN_SNAPSHOT.len() + 8 + 32 * (1 + snapshot.confirmed.len()));
    message.extend_from_slice(DOMAIN_SNAPSHOT);
    message.extend_from_slice(&snapshot.number.0.to_le_bytes());
    message.extend_from_slice(snapshot.utxo.digest().as_bytes());
    for tx in &snapshot.confirmed {
        message.extend_from_slice(tx.digest().as_bytes());
    }
    message
}
