//! Head protocol state machine.
//!
//! This crate provides the synchronous head-logic core: a deterministic
//! transition function that, given the current protocol state and an
//! incoming event, yields a new state together with side effects for the
//! shell to dispatch.
//!
//! # Architecture
//!
//! The head state machine processes events synchronously:
//!
//! - `ClientInput::Init` → post the init transaction
//! - `OnChainTx::OnInitTx` → enter the Initial phase, collect commits
//! - `OnChainTx::OnCollectComTx` → open the head with the merged utxo
//! - `Message::ReqTx`/`ReqSn`/`AckSn` → advance the off-chain ledger and
//!   the coordinated snapshot round
//! - `OnChainTx::OnCloseTx` → enter the Closed phase, contest if stale
//! - `OnChainTx::OnFanoutTx` → back to Idle
//!
//! All I/O is performed by the shell via the returned [`Outcome`].
//!
//! # Terminology
//!
//! - **Phase**: Idle → Initial → Open → Closed → Idle. Abort short-circuits
//!   Initial back to Idle; fanout ends Closed.
//!
//! - **Snapshot**: a numbered agreement on the off-chain ledger state,
//!   multi-signed by every member. Snapshot `n` is requested by its leader,
//!   round-robin over the fixed party order.
//!
//! - **Rollback**: a layer-1 reorganization. Every state keeps a back-link
//!   to its pre-chain-event predecessor, so the head can rewind to the
//!   deepest state consistent with the surviving chain.
//!
//! # Safety
//!
//! - **Ordered aggregation**: acknowledgement signatures are aggregated in
//!   the fixed party order, making the multi-signature deterministic and
//!   verifiable on chain.
//!
//! - **Single snapshot in flight**: a member signs at most one snapshot at
//!   a time; requests for a later snapshot wait until the current one is
//!   confirmed.
//!
//! # Liveness
//!
//! - **Wait, don't drop**: out-of-order requests and acknowledgements
//!   produce a [`Outcome::Wait`]; the shell re-enqueues them with a
//!   decremented TTL until they apply or expire.
//!
//! - **Contestation**: a close with a stale snapshot is answered with a
//!   contest carrying the newer one, posted against the pre-close chain
//!   state.

mod emitter;
mod environment;
mod outcome;
mod state;
mod update;

pub use emitter::{emit_snapshot, step};
pub use environment::Environment;
pub use outcome::{LogicError, Outcome, WaitReason};
pub use state::{
    ClosedState, CoordinatedHeadState, HeadState, IdleState, InitialState, OpenState, SeenSnapshot,
};
pub use update::update;
