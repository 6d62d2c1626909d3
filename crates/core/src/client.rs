//! Client-facing vocabularies: requests ingested and notifications emitted.

use crate::chain::{PostChainTx, PostTxError};
use serde::{Deserialize, Serialize};
use sluice_types::{
    IsTx, MultiSignature, NodeId, Party, Snapshot, SnapshotNumber, UnixMillis, ValidationError,
};

/// Requests a client can submit to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ClientInput<T: IsTx> {
    /// Initialize a new head with the configured parties.
    Init,
    /// Commit `utxo` into the initializing head.
    Commit { utxo: T::UTxO },
    /// Abort the initializing head.
    Abort,
    /// Submit a transaction to the open head.
    NewTx { tx: T },
    /// Close the open head.
    Close,
    /// Contest a close with our latest confirmed snapshot.
    Contest,
    /// Distribute the final utxo after the deadline.
    Fanout,
    /// Ask for the current utxo set.
    GetUTxO,
}

impl<T: IsTx> ClientInput<T> {
    /// Get the input type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientInput::Init => "Init",
            ClientInput::Commit { .. } => "Commit",
            ClientInput::Abort => "Abort",
            ClientInput::NewTx { .. } => "NewTx",
            ClientInput::Close => "Close",
            ClientInput::Contest => "Contest",
            ClientInput::Fanout => "Fanout",
            ClientInput::GetUTxO => "GetUTxO",
        }
    }
}

/// Notifications the node emits towards its client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ServerOutput<T: IsTx> {
    /// A peer connected at the transport level.
    PeerConnected { node_id: NodeId },

    /// A peer disconnected at the transport level.
    PeerDisconnected { node_id: NodeId },

    /// A head was initialized; every listed party may now commit.
    ReadyToCommit { parties: Vec<Party> },

    /// `party` committed `utxo` into the head.
    Committed { party: Party, utxo: T::UTxO },

    /// All commits were collected; the head is open with `utxo`.
    HeadIsOpen { utxo: T::UTxO },

    /// The head was aborted; `utxo` is what had been committed.
    HeadIsAborted { utxo: T::UTxO },

    /// The head was closed on chain.
    HeadIsClosed {
        snapshot_number: SnapshotNumber,
        contestation_deadline: UnixMillis,
    },

    /// A close was contested with snapshot `snapshot_number`.
    HeadIsContested { snapshot_number: SnapshotNumber },

    /// The contestation deadline passed; fanout may be posted.
    ReadyToFanout,

    /// The final utxo was distributed; the head is finalized.
    HeadIsFinalized { utxo: T::UTxO },

    /// A submitted transaction passed validation and was broadcast.
    TxValid { tx: T },

    /// A submitted transaction failed validation against `utxo`.
    TxInvalid {
        utxo: T::UTxO,
        tx: T,
        validation_error: ValidationError,
    },

    /// A transaction was applied to the local seen ledger.
    TxSeen { tx: T },

    /// A transaction could not be applied before its delivery budget ran out.
    TxExpired { tx: T },

    /// A snapshot collected every party's signature.
    SnapshotConfirmed {
        snapshot: Snapshot<T>,
        signatures: MultiSignature,
    },

    /// Response to `GetUTxO`.
    GetUTxOResponse { utxo: T::UTxO },

    /// The request is not valid in the current head phase.
    CommandFailed { input: ClientInput<T> },

    /// A chain submission failed.
    PostTxOnChainFailed {
        post_chain_tx: PostChainTx<T>,
        error: PostTxError,
    },

    /// A chain rollback rewound the head state.
    RolledBack,
}

impl<T: IsTx> ServerOutput<T> {
    /// Get the output type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerOutput::PeerConnected { .. } => "PeerConnected",
            ServerOutput::PeerDisconnected { .. } => "PeerDisconnected",
            ServerOutput::ReadyToCommit { .. } => "ReadyToCommit",
            ServerOutput::Committed { .. } => "Committed",
            ServerOutput::HeadIsOpen { .. } => "HeadIsOpen",
            ServerOutput::HeadIsAborted { .. } => "HeadIsAborted",
            ServerOutput::HeadIsClosed { .. } => "HeadIsClosed",
            ServerOutput::HeadIsContested { .. } => "HeadIsContested",
            ServerOutput::ReadyToFanout => "ReadyToFanout",
            ServerOutput::HeadIsFinalized { .. } => "HeadIsFinalized",
            ServerOutput::TxValid { .. } => "TxValid",
            ServerOutput::TxInvalid { .. } => "TxInvalid",
            ServerOutput::TxSeen { .. } => "TxSeen",
            ServerOutput::TxExpired { .. } => "TxExpired",
            ServerOutput::SnapshotConfirmed { .. } => "SnapshotConfirmed",
            ServerOutput::GetUTxOResponse { .. } => "GetUTxOResponse",
            ServerOutput::CommandFailed { .. } => "CommandFailed",
            ServerOutput::PostTxOnChainFailed { .. } => "PostTxOnChainFailed",
            ServerOutput::RolledBack => "RolledBack",
        }
    }
}
