//! The on-chain surface: transactions the head posts and observes.

use serde::{Deserialize, Serialize};
use sluice_types::{
    ConfirmedSnapshot, ContestationPeriod, HeadParameters, IsTx, Party, SnapshotNumber, UnixMillis,
};
use thiserror::Error;

/// Transactions the head asks the chain client to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum PostChainTx<T: IsTx> {
    /// Announce a new head with the given parameters.
    InitTx { parameters: HeadParameters },

    /// Commit `utxo` into the head on behalf of `party`.
    CommitTx { party: Party, utxo: T::UTxO },

    /// Abort an initializing head, returning everything committed so far.
    AbortTx { utxo: T::UTxO },

    /// Collect all commits and open the head.
    CollectComTx { utxo: T::UTxO },

    /// Close the head with the latest confirmed snapshot.
    CloseTx { confirmed_snapshot: ConfirmedSnapshot<T> },

    /// Overrule a close with a newer confirmed snapshot.
    ContestTx { confirmed_snapshot: ConfirmedSnapshot<T> },

    /// Distribute the final utxo after the contestation deadline.
    FanoutTx {
        utxo: T::UTxO,
        contestation_deadline: UnixMillis,
    },
}

impl<T: IsTx> PostChainTx<T> {
    /// Get the transaction type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            PostChainTx::InitTx { .. } => "InitTx",
            PostChainTx::CommitTx { .. } => "CommitTx",
            PostChainTx::AbortTx { .. } => "AbortTx",
            PostChainTx::CollectComTx { .. } => "CollectComTx",
            PostChainTx::CloseTx { .. } => "CloseTx",
            PostChainTx::ContestTx { .. } => "ContestTx",
            PostChainTx::FanoutTx { .. } => "FanoutTx",
        }
    }
}

/// Head transactions observed on chain.
///
/// Each observation arrives wrapped in a chain event together with the fresh
/// opaque chain state captured by the chain client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum OnChainTx<T: IsTx> {
    /// A head was initialized with these parameters.
    OnInitTx {
        contestation_period: ContestationPeriod,
        parties: Vec<Party>,
    },

    /// `party` committed `utxo` into the head.
    OnCommitTx { party: Party, utxo: T::UTxO },

    /// All commits were collected; the head is open.
    OnCollectComTx,

    /// The head was aborted before opening.
    OnAbortTx,

    /// The head was closed with the snapshot numbered `snapshot_number`.
    OnCloseTx {
        snapshot_number: SnapshotNumber,
        contestation_deadline: UnixMillis,
    },

    /// A close was contested with snapshot `snapshot_number`.
    OnContestTx { snapshot_number: SnapshotNumber },

    /// The final utxo was fanned out; the head is finalized.
    OnFanoutTx,
}

impl<T: IsTx> OnChainTx<T> {
    /// Get the observation type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            OnChainTx::OnInitTx { .. } => "OnInitTx",
            OnChainTx::OnCommitTx { .. } => "OnCommitTx",
            OnChainTx::OnCollectComTx => "OnCollectComTx",
            OnChainTx::OnAbortTx => "OnAbortTx",
            OnChainTx::OnCloseTx { .. } => "OnCloseTx",
            OnChainTx::OnContestTx { .. } => "OnContestTx",
            OnChainTx::OnFanoutTx => "OnFanoutTx",
        }
    }
}

/// Failure submitting a posted transaction, re-ingested as an event so the
/// client can be notified.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PostTxError {
    #[error("no seed utxo available to build the transaction")]
    NoSeedInput,

    #[error("the captured chain state no longer matches the chain")]
    InvalidChainState,

    #[error("transaction rejected on submission: {reason}")]
    FailedToPost { reason: String },
}
