//! Core types for the sluice head protocol.
//!
//! This crate provides the foundational types used throughout the head
//! implementation:
//!
//! - **Primitives**: content digests, signing/verification keys, signatures
//! - **Identities**: [`Party`], [`NodeId`]
//! - **Protocol data**: [`HeadParameters`], [`Snapshot`], [`ConfirmedSnapshot`]
//! - **Capability traits**: [`Ledger`], [`IsTx`], [`UTxOSet`], [`IsChainState`]
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer. Ledger
//! execution and chain observation are *capabilities*: the head logic is
//! generic over a transaction type family ([`IsTx`]) and an opaque chain
//! state ([`IsChainState`]), and validates transactions only through a
//! [`Ledger`] value passed into every call.

mod chain;
mod crypto;
mod hash;
mod ledger;
mod params;
mod party;
mod signing;
mod snapshot;
mod time;

pub use chain::IsChainState;
pub use crypto::{AggregateError, MultiSignature, Signature, SigningKey, VerificationKey};
pub use hash::{Digestible, Hash, HexError};
pub use ledger::{merge_utxo, IsTx, Ledger, UTxOSet, ValidationError};
pub use params::HeadParameters;
pub use party::{NodeId, Party};
pub use signing::{snapshot_signing_message, DOMAIN_SNAPSHOT};
pub use snapshot::{ConfirmedSnapshot, Snapshot, SnapshotNumber};
pub use time::{ChainSlot, ContestationPeriod, UnixMillis};

/// Deterministic fixtures for tests: seeded keys, a mock ledger and a mock
/// chain state.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
