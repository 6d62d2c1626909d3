//! Transition outcomes.

use crate::state::HeadState;
use sluice_core::{Effect, Event};
use sluice_types::{IsChainState, IsTx, SnapshotNumber, ValidationError};
use thiserror::Error;

/// Reasons the core asks the shell to re-deliver an event later.
///
/// A wait is not an error: the event may become applicable once other
/// events have been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReason {
    /// The carried transaction does not (yet) apply to the local ledger
    /// view.
    WaitOnNotApplicableTx { validation_error: ValidationError },

    /// A snapshot message arrived before we saw the snapshot it refers to.
    WaitOnSeenSnapshot,

    /// A snapshot message refers to a different snapshot than the one
    /// currently collecting signatures.
    WaitOnSnapshotNumber { waiting_for: SnapshotNumber },
}

/// Hard protocol violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError<T: IsTx, C: IsChainState> {
    /// The event is not applicable in the current state. The shell should
    /// log and drop it.
    #[error("event not applicable in current state")]
    InvalidEvent {
        event: Box<Event<T, C>>,
        state: Box<HeadState<T, C>>,
    },

    /// The state itself is internally inconsistent. Fatal.
    #[error("head state is internally inconsistent")]
    InvalidState { state: Box<HeadState<T, C>> },

    /// A snapshot with an unexpected number surfaced where it never should.
    #[error("unexpected snapshot: expected {expected}, got {actual}")]
    InvalidSnapshot {
        expected: SnapshotNumber,
        actual: SnapshotNumber,
    },

    /// The ledger capability reported a failure the protocol cannot absorb.
    #[error("ledger rejected the transition: {0}")]
    LedgerError(ValidationError),
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T: IsTx, C: IsChainState> {
    /// Effects to dispatch; the state is unchanged.
    OnlyEffects { effects: Vec<Effect<T, C>> },

    /// Apply the new state atomically, then dispatch the effects in order.
    NewState {
        state: HeadState<T, C>,
        effects: Vec<Effect<T, C>>,
    },

    /// Re-enqueue the same event after a delay, decrementing its TTL if it
    /// carries one.
    Wait { reason: WaitReason },

    /// Hard protocol violation.
    Error { error: LogicError<T, C> },
}

impl<T: IsTx, C: IsChainState> Outcome<T, C> {
    pub fn only_effects(effects: Vec<Effect<T, C>>) -> Self {
        Outcome::OnlyEffects { effects }
    }

    /// Benign ignore: no state change, no effects.
    pub fn ignore() -> Self {
        Outcome::OnlyEffects {
            effects: Vec::new(),
        }
    }

    pub fn new_state(state: HeadState<T, C>, effects: Vec<Effect<T, C>>) -> Self {
        Outcome::NewState { state, effects }
    }

    pub fn wait(reason: WaitReason) -> Self {
        Outcome::Wait { reason }
    }

    pub fn error(error: LogicError<T, C>) -> Self {
        Outcome::Error { error }
    }

    /// The effects this outcome dispatches, if any.
    pub fn effects(&self) -> &[Effect<T, C>] {
        match self {
            Outcome::OnlyEffects { effects } | Outcome::NewState { effects, .. } => effects,
            Outcome::Wait { .. } | Outcome::Error { .. } => &[],
        }
    }
}
