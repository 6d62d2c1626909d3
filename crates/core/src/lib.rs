//! Event and effect vocabulary for the sluice head protocol.
//!
//! This crate names the inputs and outputs of the head state machine:
//!
//! - [`Event`]: everything that can happen to a node (client requests, peer
//!   gossip, chain observations, failed submissions)
//! - [`Effect`]: everything a node can ask its shell to do (notify the
//!   client, broadcast to peers, post a chain transaction)
//! - [`Message`], [`ClientInput`], [`ServerOutput`], [`PostChainTx`],
//!   [`OnChainTx`]: the vocabularies those carry
//!
//! # Architecture
//!
//! The head logic is built on a simple event-driven model:
//!
//! ```text
//! Events → update(environment, ledger, state, event) → Outcome { state', effects }
//! ```
//!
//! Everything in this crate is **passive data**. Events describe something
//! that happened; effects describe something to do. The shell delivers
//! events, applies the new state, and enacts the effects - all I/O lives
//! there.

mod chain;
mod client;
mod effect;
mod event;
mod message;

pub use chain::{OnChainTx, PostChainTx, PostTxError};
pub use client::{ClientInput, ServerOutput};
pub use effect::Effect;
pub use event::{ChainEvent, Event, DEFAULT_TTL};
pub use message::Message;
