//! Effect types: what the state machine asks its shell to do.

use crate::chain::PostChainTx;
use crate::client::ServerOutput;
use crate::message::Message;
use sluice_types::{IsChainState, IsTx};

/// Side effects produced by a transition.
///
/// Effects are **commands** - the shell enacts them, in the order produced,
/// after applying the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<T: IsTx, C: IsChainState> {
    /// Deliver a notification to the client API.
    Client { server_output: ServerOutput<T> },

    /// Broadcast a message to all head members, the sender included.
    Network { message: Message<T> },

    /// Submit a transaction on chain, built against the captured chain
    /// state. The capture may pre-date the state the transition produced:
    /// contesting a close spends the pre-close state.
    OnChain {
        chain_state: C,
        post_chain_tx: PostChainTx<T>,
    },
}

impl<T: IsTx, C: IsChainState> Effect<T, C> {
    pub fn client(server_output: ServerOutput<T>) -> Self {
        Effect::Client { server_output }
    }

    pub fn network(message: Message<T>) -> Self {
        Effect::Network { message }
    }

    pub fn on_chain(chain_state: C, post_chain_tx: PostChainTx<T>) -> Self {
        Effect::OnChain {
            chain_state,
            post_chain_tx,
        }
    }

    /// Get the effect type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Effect::Client { .. } => "Client",
            Effect::Network { .. } => "Network",
            Effect::OnChain { .. } => "OnChain",
        }
    }
}
