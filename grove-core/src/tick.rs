#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed simulation step rate assumed by the tick-counted durations in this
/// workspace (waits are expressed in ticks, never wall-clock time).
pub const TICKS_PER_SECOND: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickContext {
    pub tick: u64,
    pub seed: u64,
}
