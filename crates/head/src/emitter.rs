//! Post-transition snapshot emission.
//!
//! Deciding whether to request the next snapshot inspects the freshly
//! computed Open state, so it runs as a second pure pass over the
//! transition's outcome rather than inside the handlers. Keeping the
//! `Requested` mark out of the transition also keeps each handler's effects
//! attributable to its own event.

use tracing::{debug, trace};

use sluice_core::{Effect, Event, Message};
use sluice_types::{IsChainState, IsTx, Ledger};

use crate::environment::Environment;
use crate::outcome::Outcome;
use crate::state::{HeadState, SeenSnapshot};
use crate::update::update;

/// Decide whether the local party should request the next snapshot.
///
/// When the transition produced an Open state and we lead the next snapshot
/// number, nothing is in flight, and there are seen transactions to settle,
/// mark the snapshot as requested and append the broadcast effect. The
/// request comes back through the network loopback like any other message.
pub fn emit_snapshot<T, C>(env: &Environment, outcome: Outcome<T, C>) -> Outcome<T, C>
where
    T: IsTx,
    C: IsChainState,
{
    match outcome {
        Outcome::NewState {
            state: HeadState::Open(mut open),
            mut effects,
        } => {
            let coordinated = &open.coordinated_head_state;
            let next_number = coordinated.confirmed_snapshot.number().next();

            if !open.parameters.is_leader(&env.party, next_number) {
                trace!(snapshot = %next_number, "not the leader for the next snapshot");
            } else if !matches!(coordinated.seen_snapshot, SeenSnapshot::None) {
                trace!(snapshot = %next_number, "snapshot already in flight");
            } else if coordinated.seen_txs.is_empty() {
                trace!(snapshot = %next_number, "no transactions to snapshot");
            } else {
                debug!(
                    snapshot = %next_number,
                    txs = coordinated.seen_txs.len(),
                    "requesting next snapshot"
                );
                let txs = coordinated.seen_txs.clone();
                open.coordinated_head_state.seen_snapshot = SeenSnapshot::Requested;
                effects.push(Effect::network(Message::ReqSn {
                    from: env.party,
                    snapshot_number: next_number,
                    txs,
                }));
            }

            Outcome::NewState {
                state: HeadState::Open(open),
                effects,
            }
        }
        other => other,
    }
}

/// One full protocol step: transition, then snapshot emission.
pub fn step<T, C, L>(
    env: &Environment,
    ledger: &L,
    state: &HeadState<T, C>,
    event: Event<T, C>,
) -> Outcome<T, C>
where
    T: IsTx,
    C: IsChainState,
    L: Ledger<T>,
{
    emit_snapshot(env, update(env, ledger, state, event))
}
