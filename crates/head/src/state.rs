//! The four-phase head state and its recoverable predecessor chain.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use sluice_types::{
    ChainSlot, ConfirmedSnapshot, HeadParameters, IsChainState, IsTx, Party, Signature, Snapshot,
    UnixMillis,
};

/// Local knowledge about the snapshot currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenSnapshot<T: IsTx> {
    /// No snapshot in flight.
    None,

    /// We requested the next snapshot and are waiting for our own request
    /// to come back through the network loopback.
    Requested,

    /// A requested snapshot is collecting acknowledgement signatures.
    ///
    /// Invariant: `snapshot.number` is one above the confirmed snapshot's
    /// number, and every key of `signatures` is a head member.
    Collecting {
        snapshot: Snapshot<T>,
        signatures: BTreeMap<Party, Signature>,
    },
}

/// Off-chain ledger view while a head is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatedHeadState<T: IsTx> {
    /// Utxo obtained by applying every seen transaction to the last
    /// confirmed utxo.
    pub seen_utxo: T::UTxO,

    /// Transactions seen since the last confirmed snapshot, in order.
    /// Never contains a transaction already settled by the confirmed
    /// snapshot.
    pub seen_txs: Vec<T>,

    /// Most recent multi-signed snapshot. Its number never decreases.
    pub confirmed_snapshot: ConfirmedSnapshot<T>,

    /// Progress of the in-flight snapshot, if any.
    pub seen_snapshot: SeenSnapshot<T>,
}

impl<T: IsTx> CoordinatedHeadState<T> {
    /// The view a head opens with: the merged committed utxo as both the
    /// seen and the initial confirmed state.
    pub fn opening(utxo: T::UTxO) -> Self {
        CoordinatedHeadState {
            seen_utxo: utxo.clone(),
            seen_txs: Vec::new(),
            confirmed_snapshot: ConfirmedSnapshot::initial(utxo),
            seen_snapshot: SeenSnapshot::None,
        }
    }
}

/// No head exists. The fixed point of every predecessor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleState<C: IsChainState> {
    pub chain_state: C,
}

/// A head was initialized and is collecting commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialState<T: IsTx, C: IsChainState> {
    pub parameters: HeadParameters,

    /// Parties that have not committed yet. Non-empty until the final
    /// commit is observed.
    pub pending_commits: BTreeSet<Party>,

    /// What each party committed so far. Strictly grows.
    pub committed: BTreeMap<Party, T::UTxO>,

    pub previous_recoverable: Arc<HeadState<T, C>>,
    pub chain_state: C,
}

impl<T: IsTx, C: IsChainState> InitialState<T, C> {
    /// Union of every utxo committed so far.
    pub fn committed_utxo(&self) -> T::UTxO {
        sluice_types::merge_utxo(self.committed.values().cloned())
    }
}

/// The head is open and processing off-chain transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenState<T: IsTx, C: IsChainState> {
    pub parameters: HeadParameters,
    pub coordinated_head_state: CoordinatedHeadState<T>,
    pub previous_recoverable: Arc<HeadState<T, C>>,
    pub chain_state: C,
}

/// The head was closed on chain; the contestation window is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedState<T: IsTx, C: IsChainState> {
    pub parameters: HeadParameters,

    /// Our latest confirmed snapshot, the one fanout will distribute.
    pub confirmed_snapshot: ConfirmedSnapshot<T>,

    /// Instant after which fanout becomes possible.
    pub contestation_deadline: UnixMillis,

    /// Whether the ready-to-fanout notification was already emitted.
    pub ready_to_fanout_sent: bool,

    pub previous_recoverable: Arc<HeadState<T, C>>,
    pub chain_state: C,
}

/// The head protocol state.
///
/// Phase order is Idle → Initial → {Open | Idle via abort} → Closed → Idle.
/// States are never mutated in place - each transition yields a fresh value,
/// and chain observations link the fresh value back to its predecessor so
/// rollbacks can rewind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState<T: IsTx, C: IsChainState> {
    Idle(IdleState<C>),
    Initial(InitialState<T, C>),
    Open(OpenState<T, C>),
    Closed(ClosedState<T, C>),
}

impl<T: IsTx, C: IsChainState> HeadState<T, C> {
    /// The state a node boots with.
    pub fn idle(chain_state: C) -> Self {
        HeadState::Idle(IdleState { chain_state })
    }

    /// The chain state captured when this state was created.
    pub fn chain_state(&self) -> &C {
        match self {
            HeadState::Idle(state) => &state.chain_state,
            HeadState::Initial(state) => &state.chain_state,
            HeadState::Open(state) => &state.chain_state,
            HeadState::Closed(state) => &state.chain_state,
        }
    }

    /// Slot of the captured chain state.
    pub fn chain_slot(&self) -> ChainSlot {
        self.chain_state().slot()
    }

    /// Phase name for logging.
    pub fn phase_name(&self) -> &'static str {
        match self {
            HeadState::Idle(_) => "Idle",
            HeadState::Initial(_) => "Initial",
            HeadState::Open(_) => "Open",
            HeadState::Closed(_) => "Closed",
        }
    }

    /// Resolve a chain rollback to `slot`.
    ///
    /// Walks the predecessor chain and returns the deepest state whose
    /// captured chain slot is at or before `slot`. Idle is the fixed point:
    /// rolling back past the beginning of a head lands there. A state
    /// already at or before `slot` is returned unchanged.
    ///
    /// Terminates because predecessor chains are finite and strictly
    /// decreasing in chain slot.
    pub fn rollback(&self, slot: ChainSlot) -> HeadState<T, C> {
        let mut current = self;
        loop {
            if current.chain_slot() <= slot {
                return current.clone();
            }
            match current {
                HeadState::Idle(_) => return current.clone(),
                HeadState::Initial(state) => current = &state.previous_recoverable,
                HeadState::Open(state) => current = &state.previous_recoverable,
                HeadState::Closed(state) => current = &state.previous_recoverable,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_types::test_utils::{test_party, MockChainState, MockTx, MockUTxO};
    use sluice_types::ContestationPeriod;

    type State = HeadState<MockTx, MockChainState>;

    fn parameters(seeds: &[u8]) -> HeadParameters {
        HeadParameters::new(
            ContestationPeriod::from_secs(10),
            seeds.iter().map(|&s| test_party(s)).collect(),
        )
    }

    /// Idle at slot 1 → Initial at slot 5 → Open at slot 9.
    fn chain_of_states() -> State {
        let idle = State::idle(MockChainState::at(1));
        let initial = HeadState::Initial(InitialState {
            parameters: parameters(&[1, 2]),
            pending_commits: BTreeSet::new(),
            committed: BTreeMap::from([(test_party(1), MockUTxO::of([1]))]),
            previous_recoverable: Arc::new(idle),
            chain_state: MockChainState::at(5),
        });
        HeadState::Open(OpenState {
            parameters: parameters(&[1, 2]),
            coordinated_head_state: CoordinatedHeadState::opening(MockUTxO::of([1, 2])),
            previous_recoverable: Arc::new(initial),
            chain_state: MockChainState::at(9),
        })
    }

    #[test]
    fn test_rollback_at_or_before_slot_is_identity() {
        let open = chain_of_states();
        assert_eq!(open.rollback(ChainSlot(9)), open);
        assert_eq!(open.rollback(ChainSlot(100)), open);
    }

    #[test]
    fn test_rollback_walks_to_deepest_consistent_state() {
        let open = chain_of_states();

        let rolled = open.rollback(ChainSlot(7));
        assert_eq!(rolled.phase_name(), "Initial");
        assert_eq!(rolled.chain_slot(), ChainSlot(5));

        let rolled = open.rollback(ChainSlot(4));
        assert_eq!(rolled.phase_name(), "Idle");
        assert_eq!(rolled.chain_slot(), ChainSlot(1));
    }

    #[test]
    fn test_rollback_bottoms_out_at_idle() {
        let open = chain_of_states();
        let rolled = open.rollback(ChainSlot(0));
        assert_eq!(rolled.phase_name(), "Idle");
    }

    #[test]
    fn test_committed_utxo_merges_all_commits() {
        let initial = InitialState::<MockTx, MockChainState> {
            parameters: parameters(&[1, 2]),
            pending_commits: BTreeSet::new(),
            committed: BTreeMap::from([
                (test_party(1), MockUTxO::of([1, 2])),
                (test_party(2), MockUTxO::of([3])),
            ]),
            previous_recoverable: Arc::new(State::idle(MockChainState::at(0))),
            chain_state: MockChainState::at(1),
        };
        assert_eq!(initial.committed_utxo(), MockUTxO::of([1, 2, 3]));
    }

    #[test]
    fn test_opening_coordinated_state() {
        let coordinated = CoordinatedHeadState::<MockTx>::opening(MockUTxO::of([1, 2]));
        assert_eq!(coordinated.seen_utxo, MockUTxO::of([1, 2]));
        assert!(coordinated.seen_txs.is_empty());
        assert_eq!(coordinated.confirmed_snapshot.number().0, 0);
        assert_eq!(coordinated.confirmed_snapshot.utxo(), &MockUTxO::of([1, 2]));
        assert_eq!(coordinated.seen_snapshot, SeenSnapshot::None);
    }
}
