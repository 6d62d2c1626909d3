//! Chain slots, wall-clock instants and protocol durations.

use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

/// Position on the layer-1 chain. Grows with chain progress; a rollback
/// names the slot everything must rewind to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ChainSlot(pub u64);

impl std::fmt::Display for ChainSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock instant in milliseconds since the Unix epoch.
///
/// The core never reads a clock; instants arrive in `Tick` events and chain
/// observations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct UnixMillis(pub u64);

impl UnixMillis {
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl Add<ContestationPeriod> for UnixMillis {
    type Output = UnixMillis;

    fn add(self, period: ContestationPeriod) -> UnixMillis {
        UnixMillis(self.0 + period.as_millis())
    }
}

impl std::fmt::Display for UnixMillis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Length of the window during which a close can still be overruled by a
/// newer snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContestationPeriod(Duration);

impl ContestationPeriod {
    pub const fn from_secs(secs: u64) -> Self {
        ContestationPeriod(Duration::from_secs(secs))
    }

    pub const fn from_duration(duration: Duration) -> Self {
        ContestationPeriod(duration)
    }

    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }

    pub const fn as_duration(&self) -> Duration {
        self.0
    }
}
