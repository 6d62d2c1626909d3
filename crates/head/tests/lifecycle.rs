//! Full lifecycle scenarios driving a node through the head protocol.
//!
//! A minimal deterministic shell: events in, effects out, `NewState`
//! applied atomically, network effects looped back by hand where a
//! scenario needs them.

use sluice_core::{
    ChainEvent, ClientInput, Effect, Event, Message, OnChainTx, PostChainTx, ServerOutput,
};
use sluice_head::{step, Environment, HeadState, Outcome, SeenSnapshot, WaitReason};
use sluice_types::test_utils::{
    test_party, test_signing_key, MockChainState, MockLedger, MockTx, MockUTxO,
};
use sluice_types::{
    ChainSlot, ContestationPeriod, Party, Signature, Snapshot, SnapshotNumber, UnixMillis,
};

type State = HeadState<MockTx, MockChainState>;
type TestEvent = Event<MockTx, MockChainState>;
type TestEffect = Effect<MockTx, MockChainState>;
type TestOutcome = Outcome<MockTx, MockChainState>;

const PERIOD: ContestationPeriod = ContestationPeriod::from_secs(10);

/// One node with its environment and current state.
struct Node {
    env: Environment,
    ledger: MockLedger,
    state: State,
}

impl Node {
    fn new(seed: u8, other_seeds: &[u8]) -> Self {
        Node {
            env: Environment::new(
                test_signing_key(seed),
                other_seeds.iter().map(|&s| test_party(s)).collect(),
                PERIOD,
            ),
            ledger: MockLedger,
            state: State::idle(MockChainState::at(0)),
        }
    }

    /// Process one event, applying any new state.
    fn feed(&mut self, event: TestEvent) -> TestOutcome {
        let outcome = step(&self.env, &self.ledger, &self.state, event);
        if let Outcome::NewState { state, .. } = &outcome {
            self.state = state.clone();
        }
        outcome
    }

    /// Process one event and return its effects, panicking on Wait/Error.
    fn effects(&mut self, event: TestEvent) -> Vec<TestEffect> {
        match self.feed(event) {
            Outcome::OnlyEffects { effects } | Outcome::NewState { effects, .. } => effects,
            other => panic!("expected effects, got {other:?}"),
        }
    }

    fn confirmed_number(&self) -> SnapshotNumber {
        let HeadState::Open(open) = &self.state else {
            panic!("not open");
        };
        open.coordinated_head_state.confirmed_snapshot.number()
    }

    fn seen_txs(&self) -> Vec<MockTx> {
        let HeadState::Open(open) = &self.state else {
            panic!("not open");
        };
        open.coordinated_head_state.seen_txs.clone()
    }
}

fn client(input: ClientInput<MockTx>) -> TestEvent {
    Event::Client { input }
}

fn network(message: Message<MockTx>) -> TestEvent {
    Event::network(message)
}

fn observation(observed_tx: OnChainTx<MockTx>, slot: u64) -> TestEvent {
    Event::OnChain {
        chain_event: ChainEvent::Observation {
            observed_tx,
            new_chain_state: MockChainState::at(slot),
        },
    }
}

/// Drive node A (seed 1) from Idle to Open with parties [A, B] committing
/// {a} and {b}. Commits are observed B first so that A, as last committer,
/// posts the collect transaction.
fn open_head(node: &mut Node) {
    let parties = vec![test_party(1), test_party(2)];

    let effects = node.effects(client(ClientInput::Init));
    assert!(matches!(
        &effects[..],
        [Effect::OnChain {
            post_chain_tx: PostChainTx::InitTx { .. },
            ..
        }]
    ));

    let effects = node.effects(observation(
        OnChainTx::OnInitTx {
            contestation_period: PERIOD,
            parties: parties.clone(),
        },
        1,
    ));
    assert_eq!(
        effects,
        vec![Effect::client(ServerOutput::ReadyToCommit { parties })]
    );

    let effects = node.effects(observation(
        OnChainTx::OnCommitTx {
            party: test_party(2),
            utxo: MockUTxO::of([2]),
        },
        2,
    ));
    assert_eq!(effects.len(), 1, "only the Committed notification");

    // Our own commit completes the set: Committed then CollectComTx.
    let effects = node.effects(observation(
        OnChainTx::OnCommitTx {
            party: test_party(1),
            utxo: MockUTxO::of([1]),
        },
        3,
    ));
    assert_eq!(
        effects,
        vec![
            Effect::client(ServerOutput::Committed {
                party: test_party(1),
                utxo: MockUTxO::of([1]),
            }),
            Effect::on_chain(
                MockChainState::at(3),
                PostChainTx::CollectComTx {
                    utxo: MockUTxO::of([1, 2]),
                },
            ),
        ]
    );

    let effects = node.effects(observation(OnChainTx::OnCollectComTx, 4));
    assert_eq!(
        effects,
        vec![Effect::client(ServerOutput::HeadIsOpen {
            utxo: MockUTxO::of([1, 2]),
        })]
    );
    assert_eq!(node.confirmed_number(), SnapshotNumber(0));
}

/// Scenario S1: initialize, commit and open a two-party head.
#[test]
fn test_two_party_head_opens() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    let HeadState::Open(open) = &node.state else {
        panic!("head should be open");
    };
    assert_eq!(
        open.coordinated_head_state.seen_utxo,
        MockUTxO::of([1, 2])
    );
    assert_eq!(
        open.coordinated_head_state.confirmed_snapshot.utxo(),
        &MockUTxO::of([1, 2])
    );
}

/// Scenario S2: one full snapshot round on the leader.
#[test]
fn test_snapshot_round_confirms() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    // A transaction spreads through the head.
    let tx = MockTx::new(10, [2], [3]);
    let effects = node.effects(network(Message::ReqTx {
        from: test_party(2),
        tx: tx.clone(),
    }));

    // Node A leads snapshot 1: the emitter appends the request.
    assert_eq!(node.seen_txs(), vec![tx.clone()]);
    let [Effect::Client {
        server_output: ServerOutput::TxSeen { .. },
    }, Effect::Network {
        message: req_sn,
    }] = &effects[..]
    else {
        panic!("expected TxSeen then ReqSn, got {effects:?}");
    };
    assert_eq!(
        req_sn,
        &Message::ReqSn {
            from: test_party(1),
            snapshot_number: SnapshotNumber(1),
            txs: vec![tx.clone()],
        }
    );
    {
        let HeadState::Open(open) = &node.state else {
            panic!("not open");
        };
        assert_eq!(
            open.coordinated_head_state.seen_snapshot,
            SeenSnapshot::Requested
        );
    }

    // The request loops back; node A signs and broadcasts its ack.
    let effects = node.effects(network(req_sn.clone()));
    let [Effect::Network {
        message: Message::AckSn {
            from: ack_from,
            signature: signature_a,
            snapshot_number,
        },
    }] = &effects[..]
    else {
        panic!("expected AckSn, got {effects:?}");
    };
    assert_eq!(*ack_from, test_party(1));
    assert_eq!(*snapshot_number, SnapshotNumber(1));

    // Reconstruct what node B would sign: same snapshot contents.
    let snapshot = Snapshot::<MockTx> {
        number: SnapshotNumber(1),
        utxo: MockUTxO::of([1, 3]),
        confirmed: vec![tx.clone()],
    };
    let signature_b = test_signing_key(2).sign(&snapshot.signing_message());

    // First ack: collected, nothing confirmed.
    let ack_a = Message::AckSn {
        from: test_party(1),
        signature: *signature_a,
        snapshot_number: SnapshotNumber(1),
    };
    let effects = node.effects(network(ack_a));
    assert!(effects.is_empty());
    assert_eq!(node.confirmed_number(), SnapshotNumber(0));

    // Second ack completes the set: snapshot 1 is confirmed.
    let effects = node.effects(network(Message::AckSn {
        from: test_party(2),
        signature: signature_b,
        snapshot_number: SnapshotNumber(1),
    }));
    assert_eq!(node.confirmed_number(), SnapshotNumber(1));
    assert!(node.seen_txs().is_empty());

    let [Effect::Client {
        server_output:
            ServerOutput::SnapshotConfirmed {
                snapshot: confirmed,
                signatures,
            },
    }] = &effects[..]
    else {
        panic!("expected SnapshotConfirmed, got {effects:?}");
    };
    assert_eq!(confirmed, &snapshot);
    assert!(signatures.verify(
        &snapshot.signing_message(),
        &[test_party(1), test_party(2)],
    ));
}

/// Scenario S3: an acknowledgement ahead of any seen snapshot waits.
#[test]
fn test_out_of_order_ack_waits() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    let outcome = node.feed(network(Message::AckSn {
        from: test_party(2),
        signature: Signature::zero(),
        snapshot_number: SnapshotNumber(1),
    }));

    assert_eq!(
        outcome,
        TestOutcome::Wait {
            reason: WaitReason::WaitOnSeenSnapshot,
        }
    );
}

/// Scenario S4: a request for a future snapshot waits.
#[test]
fn test_future_snapshot_request_waits() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    // Snapshot 2 is led by party 2; with nothing confirmed past 0 and no
    // snapshot seen, the request must wait.
    let outcome = node.feed(network(Message::ReqSn {
        from: test_party(2),
        snapshot_number: SnapshotNumber(2),
        txs: vec![],
    }));

    assert_eq!(
        outcome,
        TestOutcome::Wait {
            reason: WaitReason::WaitOnSeenSnapshot,
        }
    );
}

/// Scenario S5: a transaction that never applies expires when its TTL
/// runs out.
#[test]
fn test_ttl_expiry_reports_expired_transaction() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    // Spends an output the head never had.
    let tx = MockTx::new(10, [99], [100]);

    let outcome = node.feed(Event::Network {
        ttl: 1,
        message: Message::ReqTx {
            from: test_party(2),
            tx: tx.clone(),
        },
    });
    assert!(matches!(
        outcome,
        TestOutcome::Wait {
            reason: WaitReason::WaitOnNotApplicableTx { .. },
        }
    ));

    // The shell re-enqueues with ttl 0; the transaction expires.
    let state_before = node.state.clone();
    let effects = node.effects(Event::Network {
        ttl: 0,
        message: Message::ReqTx {
            from: test_party(2),
            tx: tx.clone(),
        },
    });
    assert_eq!(
        effects,
        vec![Effect::client(ServerOutput::TxExpired { tx })]
    );
    assert_eq!(node.state, state_before, "no state change on expiry");
}

/// Scenario S6: a contest with a stale snapshot is answered with ours.
#[test]
fn test_contest_on_stale_close() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    // Confirm snapshots 1..=3 through the full ack round each time. The
    // leader alternates: party 1 leads the odd numbers, party 2 the even.
    for number in 1..=3u64 {
        let leader_seed = if number % 2 == 1 { 1u8 } else { 2u8 };
        let tx = MockTx::new(10 + number, [number + 1], [number + 2]);
        node.effects(network(Message::ReqTx {
            from: test_party(2),
            tx: tx.clone(),
        }));

        if leader_seed == 1 {
            let HeadState::Open(open) = &node.state else {
                panic!("not open");
            };
            assert_eq!(
                open.coordinated_head_state.seen_snapshot,
                SeenSnapshot::Requested,
                "we lead snapshot {number} and should have requested it"
            );
        }

        node.effects(network(Message::ReqSn {
            from: test_party(leader_seed),
            snapshot_number: SnapshotNumber(number),
            txs: vec![tx.clone()],
        }));

        let HeadState::Open(open) = &node.state else {
            panic!("not open");
        };
        let SeenSnapshot::Collecting { snapshot, .. } =
            &open.coordinated_head_state.seen_snapshot
        else {
            panic!("should be collecting snapshot {number}");
        };
        let snapshot = snapshot.clone();

        for seed in [1u8, 2] {
            node.feed(network(Message::AckSn {
                from: test_party(seed),
                signature: test_signing_key(seed).sign(&snapshot.signing_message()),
                snapshot_number: SnapshotNumber(number),
            }));
        }
        assert_eq!(node.confirmed_number(), SnapshotNumber(number));
    }

    // The head closes with stale snapshot 2: we contest from the close
    // observation itself, using the pre-close chain state.
    let HeadState::Open(open) = &node.state else {
        panic!("not open");
    };
    let pre_close_chain_state = open.chain_state;
    let ours = open.coordinated_head_state.confirmed_snapshot.clone();

    let effects = node.effects(observation(
        OnChainTx::OnCloseTx {
            snapshot_number: SnapshotNumber(2),
            contestation_deadline: UnixMillis(30_000),
        },
        20,
    ));
    assert_eq!(
        effects,
        vec![
            Effect::client(ServerOutput::HeadIsClosed {
                snapshot_number: SnapshotNumber(2),
                contestation_deadline: UnixMillis(30_000),
            }),
            Effect::on_chain(
                pre_close_chain_state,
                PostChainTx::ContestTx {
                    confirmed_snapshot: ours.clone(),
                },
            ),
        ]
    );

    // Someone else contests with snapshot 2: ours is newer, contest again.
    let effects = node.effects(observation(
        OnChainTx::OnContestTx {
            snapshot_number: SnapshotNumber(2),
        },
        21,
    ));
    assert_eq!(
        effects,
        vec![
            Effect::client(ServerOutput::HeadIsContested {
                snapshot_number: SnapshotNumber(2),
            }),
            Effect::on_chain(
                MockChainState::at(20),
                PostChainTx::ContestTx {
                    confirmed_snapshot: ours,
                },
            ),
        ]
    );
}

/// Closed heads fan out after the contestation deadline.
#[test]
fn test_close_tick_fanout_finalizes() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    node.effects(observation(
        OnChainTx::OnCloseTx {
            snapshot_number: SnapshotNumber(0),
            contestation_deadline: UnixMillis(30_000),
        },
        20,
    ));

    // Tick before the deadline: nothing.
    let outcome = node.feed(Event::OnChain {
        chain_event: ChainEvent::Tick {
            time: UnixMillis(29_999),
        },
    });
    assert_eq!(outcome, TestOutcome::only_effects(vec![]));

    // Tick past the deadline: ready to fan out.
    let outcome = node.feed(Event::OnChain {
        chain_event: ChainEvent::Tick {
            time: UnixMillis(30_001),
        },
    });
    assert_eq!(
        outcome.effects(),
        &[Effect::client(ServerOutput::ReadyToFanout)]
    );

    // Client posts the fanout; the chain confirms; back to Idle.
    let effects = node.effects(client(ClientInput::Fanout));
    assert!(matches!(
        &effects[..],
        [Effect::OnChain {
            post_chain_tx: PostChainTx::FanoutTx { .. },
            ..
        }]
    ));

    let effects = node.effects(observation(OnChainTx::OnFanoutTx, 25));
    assert_eq!(
        effects,
        vec![Effect::client(ServerOutput::HeadIsFinalized {
            utxo: MockUTxO::of([1, 2]),
        })]
    );
    assert!(matches!(node.state, HeadState::Idle(_)));
}

/// Rolling back to the slot of the current state is the identity; rolling
/// back further rewinds along the predecessor chain.
#[test]
fn test_rollback_recovery() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);
    let open_state = node.state.clone();

    // Identity: the open state was created at slot 4.
    let outcome = node.feed(Event::OnChain {
        chain_event: ChainEvent::Rollback { slot: ChainSlot(4) },
    });
    assert_eq!(
        outcome,
        TestOutcome::new_state(
            open_state.clone(),
            vec![Effect::client(ServerOutput::RolledBack)],
        )
    );

    // Rolling back before the collect-com observation rewinds to Initial.
    let outcome = node.feed(Event::OnChain {
        chain_event: ChainEvent::Rollback { slot: ChainSlot(3) },
    });
    let Outcome::NewState { state, .. } = outcome else {
        panic!("expected NewState");
    };
    assert_eq!(state.phase_name(), "Initial");
    assert_eq!(state.chain_slot(), ChainSlot(3));

    // Rolling back before the head existed rewinds to Idle.
    let outcome = node.feed(Event::OnChain {
        chain_event: ChainEvent::Rollback { slot: ChainSlot(0) },
    });
    let Outcome::NewState { state, .. } = outcome else {
        panic!("expected NewState");
    };
    assert_eq!(state.phase_name(), "Idle");
}

/// The confirmed snapshot number never decreases across an entire run, and
/// collected signatories always come from the party set.
#[test]
fn test_confirmed_number_is_monotone_and_signers_are_members() {
    let mut node = Node::new(1, &[2]);
    open_head(&mut node);

    let parties = [test_party(1), test_party(2)];
    let mut last_confirmed = SnapshotNumber(0);

    for number in 1..=2u64 {
        let leader_seed = if number % 2 == 1 { 1u8 } else { 2u8 };
        let tx = MockTx::new(10 + number, [number + 1], [number + 2]);
        node.effects(network(Message::ReqTx {
            from: test_party(2),
            tx: tx.clone(),
        }));
        node.effects(network(Message::ReqSn {
            from: test_party(leader_seed),
            snapshot_number: SnapshotNumber(number),
            txs: vec![tx.clone()],
        }));

        let HeadState::Open(open) = &node.state else {
            panic!("not open");
        };
        let SeenSnapshot::Collecting { snapshot, .. } =
            &open.coordinated_head_state.seen_snapshot
        else {
            panic!("should be collecting");
        };
        let snapshot = snapshot.clone();

        for seed in [1u8, 2] {
            node.feed(network(Message::AckSn {
                from: test_party(seed),
                signature: test_signing_key(seed).sign(&snapshot.signing_message()),
                snapshot_number: SnapshotNumber(number),
            }));

            // Signatories stay within the party set at every step.
            let HeadState::Open(open) = &node.state else {
                panic!("not open");
            };
            if let SeenSnapshot::Collecting { signatures, .. } =
                &open.coordinated_head_state.seen_snapshot
            {
                assert!(signatures.keys().all(|party: &Party| parties.contains(party)));
            }

            assert!(node.confirmed_number() >= last_confirmed);
            last_confirmed = node.confirmed_number();
        }
    }

    assert_eq!(node.confirmed_number(), SnapshotNumber(2));
}
