//! Event types for the head state machine.

use crate::chain::{OnChainTx, PostChainTx, PostTxError};
use crate::client::ClientInput;
use crate::message::Message;
use sluice_types::{ChainSlot, IsChainState, IsTx, UnixMillis};

/// Time-to-live stamped on freshly delivered network events.
///
/// The shell decrements it each time the event is re-enqueued after a
/// `Wait`; at zero the carried transaction is treated as expired.
pub const DEFAULT_TTL: u32 = 5;

/// All possible inputs to the head state machine.
///
/// Events are **passive data** - they describe something that happened. The
/// state machine processes events and returns an outcome; it never asks for
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T: IsTx, C: IsChainState> {
    /// A request from the client API.
    Client { input: ClientInput<T> },

    /// Peer gossip, with its remaining re-enqueue budget.
    Network { ttl: u32, message: Message<T> },

    /// Something happened on the layer-1 chain.
    OnChain { chain_event: ChainEvent<T, C> },

    /// A chain submission failed; re-ingested so the client hears about it.
    PostTxError {
        post_chain_tx: PostChainTx<T>,
        error: PostTxError,
    },
}

impl<T: IsTx, C: IsChainState> Event<T, C> {
    /// Wrap a message as a freshly delivered network event.
    pub fn network(message: Message<T>) -> Self {
        Event::Network {
            ttl: DEFAULT_TTL,
            message,
        }
    }

    /// Get the event type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Client { input } => input.type_name(),
            Event::Network { message, .. } => message.type_name(),
            Event::OnChain { chain_event } => chain_event.type_name(),
            Event::PostTxError { .. } => "PostTxError",
        }
    }

    /// Check if this is a client event.
    pub fn is_client(&self) -> bool {
        matches!(self, Event::Client { .. })
    }

    /// Check if this is a network event.
    pub fn is_network(&self) -> bool {
        matches!(self, Event::Network { .. })
    }

    /// Check if this is a chain event.
    pub fn is_on_chain(&self) -> bool {
        matches!(self, Event::OnChain { .. })
    }
}

/// Chain event kinds delivered by the chain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent<T: IsTx, C: IsChainState> {
    /// A head transaction was observed, together with the chain state
    /// captured right after it.
    Observation {
        observed_tx: OnChainTx<T>,
        new_chain_state: C,
    },

    /// The chain reorganized; observations after `slot` are invalid.
    Rollback { slot: ChainSlot },

    /// Wall-clock progress as seen by the chain client.
    Tick { time: UnixMillis },
}

impl<T: IsTx, C: IsChainState> ChainEvent<T, C> {
    /// Get the chain event type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            ChainEvent::Observation { observed_tx, .. } => observed_tx.type_name(),
            ChainEvent::Rollback { .. } => "Rollback",
            ChainEvent::Tick { .. } => "Tick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_types::test_utils::{test_party, MockChainState, MockTx};

    #[test]
    fn test_network_constructor_stamps_default_ttl() {
        let event: Event<MockTx, MockChainState> = Event::network(Message::ReqTx {
            from: test_party(1),
            tx: MockTx::new(1, [1], [2]),
        });
        assert!(matches!(event, Event::Network { ttl: DEFAULT_TTL, .. }));
        assert!(event.is_network());
        assert_eq!(event.type_name(), "ReqTx");
    }

    #[test]
    fn test_chain_event_type_names() {
        let tick: ChainEvent<MockTx, MockChainState> = ChainEvent::Tick {
            time: UnixMillis(1),
        };
        assert_eq!(tick.type_name(), "Tick");

        let observation: ChainEvent<MockTx, MockChainState> = ChainEvent::Observation {
            observed_tx: OnChainTx::OnCollectComTx,
            new_chain_state: MockChainState::at(4),
        };
        assert_eq!(observation.type_name(), "OnCollectComTx");
    }
}
