//! Chain-state capability.

use crate::time::ChainSlot;

/// Opaque layer-1 state token threaded through the head states.
///
/// The chain collaborator attaches a fresh token to every observation; the
/// core stores it, hands it back when posting transactions, and only ever
/// asks for its slot when resolving rollbacks.
pub trait IsChainState: Clone + Eq + std::fmt::Debug + 'static {
    /// Slot at which this chain state was captured.
    fn slot(&self) -> ChainSlot;
}
