//! Network messages exchanged between head members.

use serde::{Deserialize, Serialize};
use sluice_types::{IsTx, NodeId, Party, Signature, SnapshotNumber};

/// Messages broadcast between head members.
///
/// Every broadcast reaches every member, the sender included - the snapshot
/// protocol relies on the leader consuming its own `ReqSn` through the
/// loopback. `from` identifies the sender; the transport is assumed to have
/// authenticated it, while snapshot signatures provide content authenticity
/// on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Message<T: IsTx> {
    /// Ask every member to apply `tx` to its local seen ledger.
    ReqTx { from: Party, tx: T },

    /// Leader's request to sign the next snapshot over `txs`.
    ReqSn {
        from: Party,
        snapshot_number: SnapshotNumber,
        txs: Vec<T>,
    },

    /// A member's signature acknowledging a requested snapshot.
    AckSn {
        from: Party,
        signature: Signature,
        snapshot_number: SnapshotNumber,
    },

    /// Transport-level notification that a peer appeared.
    Connected { node_id: NodeId },

    /// Transport-level notification that a peer vanished.
    Disconnected { node_id: NodeId },
}

impl<T: IsTx> Message<T> {
    /// Get the message type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::ReqTx { .. } => "ReqTx",
            Message::ReqSn { .. } => "ReqSn",
            Message::AckSn { .. } => "AckSn",
            Message::Connected { .. } => "Connected",
            Message::Disconnected { .. } => "Disconnected",
        }
    }

    /// Check if this is a snapshot protocol message.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Message::ReqSn { .. } | Message::AckSn { .. })
    }
}
