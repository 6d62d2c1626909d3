//! The pure transition function.
//!
//! `update` dispatches on (phase, event) and returns an [`Outcome`]. Every
//! handler is pure: no I/O, no clock, no randomness. The shell serializes
//! calls, applies `NewState` atomically, dispatches effects in order, and
//! re-enqueues `Wait`ed events with a decremented TTL.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use sluice_core::{
    ChainEvent, ClientInput, Effect, Event, Message, OnChainTx, PostChainTx, PostTxError,
    ServerOutput,
};
use sluice_types::{
    ChainSlot, ConfirmedSnapshot, ContestationPeriod, HeadParameters, IsChainState, IsTx, Ledger,
    MultiSignature, Party, Signature, Snapshot, SnapshotNumber, UnixMillis,
};

use crate::environment::Environment;
use crate::outcome::{LogicError, Outcome, WaitReason};
use crate::state::{
    ClosedState, CoordinatedHeadState, HeadState, IdleState, InitialState, OpenState, SeenSnapshot,
};

/// Compute one step of the protocol.
///
/// Deterministic: equal inputs yield equal outcomes. The snapshot emitter
/// ([`crate::emit_snapshot`]) is a separate second pass; shells that do not
/// interpose between the two should call [`crate::step`] instead.
#[instrument(skip_all, fields(phase = state.phase_name(), event = event.type_name()))]
pub fn update<T, C, L>(
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
    match (state, event) {
        // ═══════════════════════════════════════════════════════════════════
        // Idle
        // ═══════════════════════════════════════════════════════════════════
        (
            HeadState::Idle(idle),
            Event::Client {
                input: ClientInput::Init,
            },
        ) => on_idle_client_init(env, idle),

        (
            HeadState::Idle(_),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx:
                            OnChainTx::OnInitTx {
                                contestation_period,
                                parties,
                            },
                        new_chain_state,
                    },
            },
        ) => on_init_observed(state, contestation_period, parties, new_chain_state),

        // ═══════════════════════════════════════════════════════════════════
        // Initial: collecting commits
        // ═══════════════════════════════════════════════════════════════════
        (
            HeadState::Initial(initial),
            Event::Client {
                input: ClientInput::Commit { utxo },
            },
        ) => on_initial_client_commit(env, initial, utxo),

        (
            HeadState::Initial(initial),
            Event::Client {
                input: ClientInput::GetUTxO,
            },
        ) => Outcome::only_effects(vec![Effect::client(ServerOutput::GetUTxOResponse {
            utxo: initial.committed_utxo(),
        })]),

        (
            HeadState::Initial(initial),
            Event::Client {
                input: ClientInput::Abort,
            },
        ) => Outcome::only_effects(vec![Effect::on_chain(
            initial.chain_state.clone(),
            PostChainTx::AbortTx {
                utxo: initial.committed_utxo(),
            },
        )]),

        (
            HeadState::Initial(initial),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx: OnChainTx::OnCommitTx { party, utxo },
                        new_chain_state,
                    },
            },
        ) => on_commit_observed(env, state, initial, party, utxo, new_chain_state),

        (
            HeadState::Initial(initial),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx: OnChainTx::OnCollectComTx,
                        new_chain_state,
                    },
            },
        ) => on_collect_com_observed(state, initial, new_chain_state),

        (
            HeadState::Initial(initial),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx: OnChainTx::OnAbortTx,
                        new_chain_state,
                    },
            },
        ) => on_abort_observed(initial, new_chain_state),

        // ═══════════════════════════════════════════════════════════════════
        // Open: layer-2 transactions
        // ═══════════════════════════════════════════════════════════════════
        (
            HeadState::Open(open),
            Event::Client {
                input: ClientInput::NewTx { tx },
            },
        ) => on_open_client_new_tx(env, ledger, open, tx),

        (
            HeadState::Open(open),
            Event::Network {
                ttl,
                message: Message::ReqTx { tx, .. },
            },
        ) => on_open_network_req_tx(ledger, open, ttl, tx),

        // ═══════════════════════════════════════════════════════════════════
        // Open: coordinated snapshot round
        // ═══════════════════════════════════════════════════════════════════
        (
            HeadState::Open(open),
            Event::Network {
                ttl,
                message:
                    Message::ReqSn {
                        from,
                        snapshot_number,
                        txs,
                    },
            },
        ) => on_open_network_req_sn(env, ledger, state, open, ttl, from, snapshot_number, txs),

        (
            HeadState::Open(open),
            Event::Network {
                message:
                    Message::AckSn {
                        from,
                        signature,
                        snapshot_number,
                    },
                ..
            },
        ) => on_open_network_ack_sn(state, open, from, signature, snapshot_number),

        // ═══════════════════════════════════════════════════════════════════
        // Open: closing
        // ═══════════════════════════════════════════════════════════════════
        (
            HeadState::Open(open),
            Event::Client {
                input: ClientInput::Close,
            },
        ) => Outcome::only_effects(vec![Effect::on_chain(
            open.chain_state.clone(),
            PostChainTx::CloseTx {
                confirmed_snapshot: open.coordinated_head_state.confirmed_snapshot.clone(),
            },
        )]),

        (
            HeadState::Open(open),
            Event::Client {
                input: ClientInput::GetUTxO,
            },
        ) => Outcome::only_effects(vec![Effect::client(ServerOutput::GetUTxOResponse {
            utxo: open.coordinated_head_state.confirmed_snapshot.utxo().clone(),
        })]),

        (
            HeadState::Open(open),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx:
                            OnChainTx::OnCloseTx {
                                snapshot_number,
                                contestation_deadline,
                            },
                        new_chain_state,
                    },
            },
        ) => on_close_observed(
            state,
            open,
            snapshot_number,
            contestation_deadline,
            new_chain_state,
        ),

        // ═══════════════════════════════════════════════════════════════════
        // Closed: contestation window and fanout
        // ═══════════════════════════════════════════════════════════════════
        (
            HeadState::Closed(closed),
            Event::Client {
                input: ClientInput::Contest,
            },
        ) => Outcome::only_effects(vec![Effect::on_chain(
            closed.chain_state.clone(),
            PostChainTx::ContestTx {
                confirmed_snapshot: closed.confirmed_snapshot.clone(),
            },
        )]),

        (
            HeadState::Closed(closed),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx: OnChainTx::OnContestTx { snapshot_number },
                        ..
                    },
            },
        ) => on_contest_observed(closed, snapshot_number),

        (
            HeadState::Closed(closed),
            Event::OnChain {
                chain_event: ChainEvent::Tick { time },
            },
        ) => on_closed_tick(closed, time),

        (
            HeadState::Closed(closed),
            Event::Client {
                input: ClientInput::Fanout,
            },
        ) => Outcome::only_effects(vec![Effect::on_chain(
            closed.chain_state.clone(),
            PostChainTx::FanoutTx {
                utxo: closed.confirmed_snapshot.utxo().clone(),
                contestation_deadline: closed.contestation_deadline,
            },
        )]),

        (
            HeadState::Closed(closed),
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx: OnChainTx::OnFanoutTx,
                        new_chain_state,
                    },
            },
        ) => on_fanout_observed(closed, new_chain_state),

        // ═══════════════════════════════════════════════════════════════════
        // Any phase
        // ═══════════════════════════════════════════════════════════════════
        (
            _,
            Event::OnChain {
                chain_event: ChainEvent::Rollback { slot },
            },
        ) => on_rollback(state, slot),

        (
            _,
            Event::Network {
                message: Message::Connected { node_id },
                ..
            },
        ) => Outcome::only_effects(vec![Effect::client(ServerOutput::PeerConnected { node_id })]),

        (
            _,
            Event::Network {
                message: Message::Disconnected { node_id },
                ..
            },
        ) => Outcome::only_effects(vec![Effect::client(ServerOutput::PeerDisconnected {
            node_id,
        })]),

        (
            _,
            Event::PostTxError {
                post_chain_tx,
                error,
            },
        ) => on_post_tx_error(post_chain_tx, error),

        // Benign ignores: a commit observed after collect-com, and ticks
        // that trigger nothing.
        (
            _,
            Event::OnChain {
                chain_event:
                    ChainEvent::Observation {
                        observed_tx: OnChainTx::OnCommitTx { party, .. },
                        ..
                    },
            },
        ) => {
            debug!(party = %party, phase = state.phase_name(), "ignoring stray commit observation");
            Outcome::ignore()
        }

        (
            _,
            Event::OnChain {
                chain_event: ChainEvent::Tick { .. },
            },
        ) => Outcome::ignore(),

        // Client requests not applicable in the current phase.
        (_, Event::Client { input }) => {
            debug!(input = input.type_name(), phase = state.phase_name(), "command failed");
            Outcome::only_effects(vec![Effect::client(ServerOutput::CommandFailed { input })])
        }

        // Everything else is a protocol violation.
        (_, event) => invalid_event(state, event),
    }
}

fn invalid_event<T: IsTx, C: IsChainState>(
    state: &HeadState<T, C>,
    event: Event<T, C>,
) -> Outcome<T, C> {
    warn!(
        event = event.type_name(),
        phase = state.phase_name(),
        "invalid event for current state"
    );
    Outcome::error(LogicError::InvalidEvent {
        event: Box::new(event),
        state: Box::new(state.clone()),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Idle handlers
// ═══════════════════════════════════════════════════════════════════════════

fn on_idle_client_init<T: IsTx, C: IsChainState>(
    env: &Environment,
    idle: &IdleState<C>,
) -> Outcome<T, C> {
    info!("initializing a new head");
    Outcome::only_effects(vec![Effect::on_chain(
        idle.chain_state.clone(),
        PostChainTx::InitTx {
            parameters: env.initial_parameters(),
        },
    )])
}

fn on_init_observed<T: IsTx, C: IsChainState>(
    state: &HeadState<T, C>,
    contestation_period: ContestationPeriod,
    parties: Vec<Party>,
    new_chain_state: C,
) -> Outcome<T, C> {
    info!(parties = parties.len(), "head initialized, awaiting commits");
    let initial = InitialState {
        parameters: HeadParameters::new(contestation_period, parties.clone()),
        pending_commits: parties.iter().copied().collect(),
        committed: BTreeMap::new(),
        previous_recoverable: Arc::new(state.clone()),
        chain_state: new_chain_state,
    };
    Outcome::new_state(
        HeadState::Initial(initial),
        vec![Effect::client(ServerOutput::ReadyToCommit { parties })],
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// Initial handlers
// ═══════════════════════════════════════════════════════════════════════════

fn on_initial_client_commit<T: IsTx, C: IsChainState>(
    env: &Environment,
    initial: &InitialState<T, C>,
    utxo: T::UTxO,
) -> Outcome<T, C> {
    if initial.pending_commits.contains(&env.party) {
        Outcome::only_effects(vec![Effect::on_chain(
            initial.chain_state.clone(),
            PostChainTx::CommitTx {
                party: env.party,
                utxo,
            },
        )])
    } else {
        debug!("commit rejected: we already committed");
        Outcome::only_effects(vec![Effect::client(ServerOutput::CommandFailed {
            input: ClientInput::Commit { utxo },
        })])
    }
}

fn on_commit_observed<T: IsTx, C: IsChainState>(
    env: &Environment,
    state: &HeadState<T, C>,
    initial: &InitialState<T, C>,
    party: Party,
    utxo: T::UTxO,
    new_chain_state: C,
) -> Outcome<T, C> {
    if !initial.pending_commits.contains(&party) {
        warn!(party = %party, "ignoring commit from a party with no pending commit");
        return Outcome::ignore();
    }

    let mut pending_commits = initial.pending_commits.clone();
    pending_commits.remove(&party);
    let mut committed = initial.committed.clone();
    committed.insert(party, utxo.clone());

    info!(party = %party, remaining = pending_commits.len(), "commit observed");

    let mut effects = vec![Effect::client(ServerOutput::Committed { party, utxo })];

    // Last-committer tie-break: the node whose own commit completes the set
    // posts the collect transaction, so exactly one member does.
    if pending_commits.is_empty() && party == env.party {
        let collected = sluice_types::merge_utxo(committed.values().cloned());
        effects.push(Effect::on_chain(
            new_chain_state.clone(),
            PostChainTx::CollectComTx { utxo: collected },
        ));
    }

    let next = InitialState {
        parameters: initial.parameters.clone(),
        pending_commits,
        committed,
        previous_recoverable: Arc::new(state.clone()),
        chain_state: new_chain_state,
    };
    Outcome::new_state(HeadState::Initial(next), effects)
}

fn on_collect_com_observed<T: IsTx, C: IsChainState>(
    state: &HeadState<T, C>,
    initial: &InitialState<T, C>,
    new_chain_state: C,
) -> Outcome<T, C> {
    let utxo = initial.committed_utxo();
    info!("all commits collected, head is open");
    let open = OpenState {
        parameters: initial.parameters.clone(),
        coordinated_head_state: CoordinatedHeadState::opening(utxo.clone()),
        previous_recoverable: Arc::new(state.clone()),
        chain_state: new_chain_state,
    };
    Outcome::new_state(
        HeadState::Open(open),
        vec![Effect::client(ServerOutput::HeadIsOpen { utxo })],
    )
}

fn on_abort_observed<T: IsTx, C: IsChainState>(
    initial: &InitialState<T, C>,
    new_chain_state: C,
) -> Outcome<T, C> {
    let utxo = initial.committed_utxo();
    info!("head aborted");
    Outcome::new_state(
        HeadState::idle(new_chain_state),
        vec![Effect::client(ServerOutput::HeadIsAborted { utxo })],
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// Open handlers: layer-2 transactions
// ═══════════════════════════════════════════════════════════════════════════

fn on_open_client_new_tx<T: IsTx, C: IsChainState, L: Ledger<T>>(
    env: &Environment,
    ledger: &L,
    open: &OpenState<T, C>,
    tx: T,
) -> Outcome<T, C> {
    let confirmed_utxo = open.coordinated_head_state.confirmed_snapshot.utxo();
    match ledger.can_apply(confirmed_utxo, &tx) {
        Ok(()) => Outcome::only_effects(vec![
            Effect::client(ServerOutput::TxValid { tx: tx.clone() }),
            Effect::network(Message::ReqTx {
                from: env.party,
                tx,
            }),
        ]),
        Err(validation_error) => {
            debug!(error = %validation_error, "submitted transaction is invalid");
            Outcome::only_effects(vec![Effect::client(ServerOutput::TxInvalid {
                utxo: confirmed_utxo.clone(),
                tx,
                validation_error,
            })])
        }
    }
}

fn on_open_network_req_tx<T: IsTx, C: IsChainState, L: Ledger<T>>(
    ledger: &L,
    open: &OpenState<T, C>,
    ttl: u32,
    tx: T,
) -> Outcome<T, C> {
    if ttl == 0 {
        debug!("transaction expired before becoming applicable");
        return Outcome::only_effects(vec![Effect::client(ServerOutput::TxExpired { tx })]);
    }

    let coordinated = &open.coordinated_head_state;
    match ledger.apply_transactions(coordinated.seen_utxo.clone(), std::slice::from_ref(&tx)) {
        Ok(seen_utxo) => {
            let mut next = open.clone();
            next.coordinated_head_state.seen_utxo = seen_utxo;
            next.coordinated_head_state.seen_txs.push(tx.clone());
            Outcome::new_state(
                HeadState::Open(next),
                vec![Effect::client(ServerOutput::TxSeen { tx })],
            )
        }
        Err(validation_error) => Outcome::wait(WaitReason::WaitOnNotApplicableTx {
            validation_error,
        }),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Open handlers: coordinated snapshot round
// ═══════════════════════════════════════════════════════════════════════════

#[allow(clippy::too_many_arguments)]
fn on_open_network_req_sn<T: IsTx, C: IsChainState, L: Ledger<T>>(
    env: &Environment,
    ledger: &L,
    state: &HeadState<T, C>,
    open: &OpenState<T, C>,
    ttl: u32,
    from: Party,
    snapshot_number: SnapshotNumber,
    txs: Vec<T>,
) -> Outcome<T, C> {
    let coordinated = &open.coordinated_head_state;
    let confirmed_number = coordinated.confirmed_snapshot.number();
    let from_leads = open.parameters.is_leader(&from, snapshot_number);
    let collecting = matches!(coordinated.seen_snapshot, SeenSnapshot::Collecting { .. });

    // Accept and sign: the request is the direct successor of the confirmed
    // snapshot, comes from its leader, and nothing else is collecting.
    if snapshot_number == confirmed_number.next() && from_leads && !collecting {
        let confirmed_utxo = coordinated.confirmed_snapshot.utxo().clone();
        return match ledger.apply_transactions(confirmed_utxo, &txs) {
            Ok(utxo) => {
                let snapshot = Snapshot {
                    number: snapshot_number,
                    utxo,
                    confirmed: txs,
                };
                let signature = env.sign(&snapshot.signing_message());
                info!(
                    snapshot = %snapshot_number,
                    txs = snapshot.confirmed.len(),
                    "acknowledging requested snapshot"
                );
                let mut next = open.clone();
                next.coordinated_head_state.seen_snapshot = SeenSnapshot::Collecting {
                    snapshot,
                    signatures: BTreeMap::new(),
                };
                Outcome::new_state(
                    HeadState::Open(next),
                    vec![Effect::network(Message::AckSn {
                        from: env.party,
                        signature,
                        snapshot_number,
                    })],
                )
            }
            // An honest leader only requests transactions that applied to
            // the confirmed utxo, so this path means the leader diverged.
            // Defer rather than assert.
            Err(validation_error) => Outcome::wait(WaitReason::WaitOnNotApplicableTx {
                validation_error,
            }),
        };
    }

    // A future request from the right leader: defer until we catch up,
    // except a second request for the snapshot already collecting.
    if snapshot_number > confirmed_number && from_leads {
        return match &coordinated.seen_snapshot {
            SeenSnapshot::Collecting { snapshot, .. } if snapshot.number == snapshot_number => {
                warn!(snapshot = %snapshot_number, "duplicate snapshot request");
                invalid_event(
                    state,
                    Event::Network {
                        ttl,
                        message: Message::ReqSn {
                            from,
                            snapshot_number,
                            txs,
                        },
                    },
                )
            }
            SeenSnapshot::Collecting { snapshot, .. } => {
                Outcome::wait(WaitReason::WaitOnSnapshotNumber {
                    waiting_for: snapshot.number,
                })
            }
            SeenSnapshot::None | SeenSnapshot::Requested => {
                Outcome::wait(WaitReason::WaitOnSeenSnapshot)
            }
        };
    }

    warn!(
        snapshot = %snapshot_number,
        confirmed = %confirmed_number,
        from = %from,
        "snapshot request stale or from a non-leader"
    );
    invalid_event(
        state,
        Event::Network {
            ttl,
            message: Message::ReqSn {
                from,
                snapshot_number,
                txs,
            },
        },
    )
}

fn on_open_network_ack_sn<T: IsTx, C: IsChainState>(
    state: &HeadState<T, C>,
    open: &OpenState<T, C>,
    from: Party,
    signature: Signature,
    snapshot_number: SnapshotNumber,
) -> Outcome<T, C> {
    let coordinated = &open.coordinated_head_state;
    let (snapshot, signatures) = match &coordinated.seen_snapshot {
        SeenSnapshot::None | SeenSnapshot::Requested => {
            return Outcome::wait(WaitReason::WaitOnSeenSnapshot);
        }
        SeenSnapshot::Collecting {
            snapshot,
            signatures,
        } => {
            if snapshot.number != snapshot_number {
                return Outcome::wait(WaitReason::WaitOnSnapshotNumber {
                    waiting_for: snapshot.number,
                });
            }
            (snapshot, signatures)
        }
    };

    let mut collected = signatures.clone();
    if !open.parameters.is_member(&from) {
        warn!(party = %from, "acknowledgement from a key outside the head");
    } else if from.vkey.verify(&snapshot.signing_message(), &signature) {
        collected.insert(from, signature);
    } else {
        warn!(party = %from, snapshot = %snapshot_number, "invalid acknowledgement signature");
    }

    let everyone_signed = open
        .parameters
        .parties
        .iter()
        .all(|party| collected.contains_key(party));

    if everyone_signed {
        let multisig = match MultiSignature::aggregate_in_order(&collected, &open.parameters.parties)
        {
            Ok(multisig) => multisig,
            Err(error) => {
                warn!(error = %error, "failed to aggregate acknowledgement signatures");
                return Outcome::error(LogicError::InvalidState {
                    state: Box::new(state.clone()),
                });
            }
        };

        info!(snapshot = %snapshot_number, "snapshot confirmed by every member");
        let confirmed = snapshot.clone();
        let mut next = open.clone();
        let next_coordinated = &mut next.coordinated_head_state;
        next_coordinated
            .seen_txs
            .retain(|tx| !confirmed.confirmed.contains(tx));
        next_coordinated.confirmed_snapshot = ConfirmedSnapshot::Confirmed {
            snapshot: confirmed.clone(),
            signatures: multisig.clone(),
        };
        next_coordinated.seen_snapshot = SeenSnapshot::None;
        Outcome::new_state(
            HeadState::Open(next),
            vec![Effect::client(ServerOutput::SnapshotConfirmed {
                snapshot: confirmed,
                signatures: multisig,
            })],
        )
    } else {
        debug!(
            snapshot = %snapshot_number,
            collected = collected.len(),
            of = open.parameters.parties.len(),
            "acknowledgement recorded"
        );
        let mut next = open.clone();
        next.coordinated_head_state.seen_snapshot = SeenSnapshot::Collecting {
            snapshot: snapshot.clone(),
            signatures: collected,
        };
        Outcome::new_state(HeadState::Open(next), vec![])
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Closing, contesting, fanout
// ═══════════════════════════════════════════════════════════════════════════

fn on_close_observed<T: IsTx, C: IsChainState>(
    state: &HeadState<T, C>,
    open: &OpenState<T, C>,
    snapshot_number: SnapshotNumber,
    contestation_deadline: UnixMillis,
    new_chain_state: C,
) -> Outcome<T, C> {
    let confirmed_snapshot = open.coordinated_head_state.confirmed_snapshot.clone();
    let our_number = confirmed_snapshot.number();

    info!(
        closed = %snapshot_number,
        deadline = %contestation_deadline,
        "head closed on chain"
    );

    let mut effects = vec![Effect::client(ServerOutput::HeadIsClosed {
        snapshot_number,
        contestation_deadline,
    })];

    if our_number > snapshot_number {
        info!(ours = %our_number, "close used a stale snapshot, contesting");
        // The close consumed the current chain state; a contest must spend
        // the state captured before the close.
        effects.push(Effect::on_chain(
            open.chain_state.clone(),
            PostChainTx::ContestTx {
                confirmed_snapshot: confirmed_snapshot.clone(),
            },
        ));
    }

    let closed = ClosedState {
        parameters: open.parameters.clone(),
        confirmed_snapshot,
        contestation_deadline,
        ready_to_fanout_sent: false,
        previous_recoverable: Arc::new(state.clone()),
        chain_state: new_chain_state,
    };
    Outcome::new_state(HeadState::Closed(closed), effects)
}

fn on_contest_observed<T: IsTx, C: IsChainState>(
    closed: &ClosedState<T, C>,
    snapshot_number: SnapshotNumber,
) -> Outcome<T, C> {
    let our_number = closed.confirmed_snapshot.number();
    let mut effects = vec![Effect::client(ServerOutput::HeadIsContested {
        snapshot_number,
    })];

    if our_number > snapshot_number {
        info!(
            contested = %snapshot_number,
            ours = %our_number,
            "contest used a stale snapshot, contesting with ours"
        );
        effects.push(Effect::on_chain(
            closed.chain_state.clone(),
            PostChainTx::ContestTx {
                confirmed_snapshot: closed.confirmed_snapshot.clone(),
            },
        ));
    } else if snapshot_number > our_number {
        // A newer snapshot than ours won; fanning out our snapshot may no
        // longer be possible.
        warn!(
            contested = %snapshot_number,
            ours = %our_number,
            "contested with a snapshot newer than ours"
        );
    }

    Outcome::only_effects(effects)
}

fn on_closed_tick<T: IsTx, C: IsChainState>(
    closed: &ClosedState<T, C>,
    time: UnixMillis,
) -> Outcome<T, C> {
    if time > closed.contestation_deadline && !closed.ready_to_fanout_sent {
        info!(deadline = %closed.contestation_deadline, "contestation period elapsed");
        let mut next = closed.clone();
        next.ready_to_fanout_sent = true;
        Outcome::new_state(
            HeadState::Closed(next),
            vec![Effect::client(ServerOutput::ReadyToFanout)],
        )
    } else {
        Outcome::ignore()
    }
}

fn on_fanout_observed<T: IsTx, C: IsChainState>(
    closed: &ClosedState<T, C>,
    new_chain_state: C,
) -> Outcome<T, C> {
    let utxo = closed.confirmed_snapshot.utxo().clone();
    info!("head finalized");
    Outcome::new_state(
        HeadState::idle(new_chain_state),
        vec![Effect::client(ServerOutput::HeadIsFinalized { utxo })],
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// Cross-phase handlers
// ═══════════════════════════════════════════════════════════════════════════

fn on_rollback<T: IsTx, C: IsChainState>(
    state: &HeadState<T, C>,
    slot: ChainSlot,
) -> Outcome<T, C> {
    let rolled_back = state.rollback(slot);
    info!(
        slot = %slot,
        from = state.phase_name(),
        to = rolled_back.phase_name(),
        "chain rolled back"
    );
    Outcome::new_state(
        rolled_back,
        vec![Effect::client(ServerOutput::RolledBack)],
    )
}

fn on_post_tx_error<T: IsTx, C: IsChainState>(
    post_chain_tx: PostChainTx<T>,
    error: PostTxError,
) -> Outcome<T, C> {
    warn!(
        tx = post_chain_tx.type_name(),
        error = %error,
        "failed to post chain transaction"
    );
    Outcome::only_effects(vec![Effect::client(ServerOutput::PostTxOnChainFailed {
        post_chain_tx,
        error,
    })])
}
