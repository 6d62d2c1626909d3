//! Per-node identity and static parameters.

use sluice_types::{ContestationPeriod, HeadParameters, Party, Signature, SigningKey};

/// Identity of the local node, immutable for its lifetime.
///
/// Threaded by reference through every transition call; there is no global
/// state anywhere in the core.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Our own party.
    pub party: Party,

    /// Key used to sign snapshot acknowledgements.
    pub signing_key: SigningKey,

    /// Every other member of the head.
    pub other_parties: Vec<Party>,

    /// Contestation period proposed when we initialize a head.
    pub contestation_period: ContestationPeriod,
}

impl Environment {
    /// Build an environment; the local party derives from the signing key.
    pub fn new(
        signing_key: SigningKey,
        other_parties: Vec<Party>,
        contestation_period: ContestationPeriod,
    ) -> Self {
        Environment {
            party: Party::new(signing_key.verification_key()),
            signing_key,
            other_parties,
            contestation_period,
        }
    }

    /// Parameters proposed when this node initializes a head: our party
    /// first, then the other members.
    ///
    /// The parameters every member ultimately adopts are the ones observed
    /// in the init transaction, so all nodes converge on one order.
    pub fn initial_parameters(&self) -> HeadParameters {
        let mut parties = Vec::with_capacity(1 + self.other_parties.len());
        parties.push(self.party);
        parties.extend(self.other_parties.iter().copied());
        HeadParameters::new(self.contestation_period, parties)
    }

    /// Sign a message with our key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}
