//! Immutable parameters fixed when a head is initialized.

use crate::party::Party;
use crate::snapshot::SnapshotNumber;
use crate::time::ContestationPeriod;
use serde::{Deserialize, Serialize};

/// Parameters every member agreed on at initialization.
///
/// The order of `parties` is significant: it fixes the snapshot leader
/// schedule and the signature aggregation order, so all members must hold
/// the same sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadParameters {
    pub contestation_period: ContestationPeriod,
    pub parties: Vec<Party>,
}

impl HeadParameters {
    pub fn new(contestation_period: ContestationPeriod, parties: Vec<Party>) -> Self {
        HeadParameters {
            contestation_period,
            parties,
        }
    }

    /// The party responsible for requesting snapshot `number`.
    ///
    /// Round-robin over the fixed party order: snapshot `n` (n >= 1) is led
    /// by the party at index `(n - 1) mod |parties|`. Snapshot 0 is the
    /// initial snapshot and has no leader.
    pub fn leader(&self, number: SnapshotNumber) -> Option<&Party> {
        if number.0 == 0 {
            return None;
        }
        let index = ((number.0 - 1) as usize) % self.parties.len().max(1);
        self.parties.get(index)
    }

    /// Whether `party` leads snapshot `number`.
    pub fn is_leader(&self, party: &Party, number: SnapshotNumber) -> bool {
        self.leader(number) == Some(party)
    }

    /// Whether `party` is a member of the head.
    pub fn is_member(&self, party: &Party) -> bool {
        self.parties.contains(party)
    }
}
