use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stage cycle of a harvester.
///
/// The stored state names the last stage that was *entered*; a ready tick
/// advances to `successor()` and runs that stage's entry action. Failure
/// recoveries re-point the state so the successor rule retries the right
/// stage (e.g. state `Acting` retries delivery, state `Searching` retries
/// travel with the same target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AgentState {
    Idle,
    Searching,
    ToTarget,
    Acting,
    ToDelivery,
}

impl AgentState {
    pub fn successor(self) -> Self {
        match self {
            Self::Idle => Self::Searching,
            Self::Searching => Self::ToTarget,
            Self::ToTarget => Self::Acting,
            Self::Acting => Self::ToDelivery,
            Self::ToDelivery => Self::Idle,
        }
    }

    /// Stable name used for persistence; round-trips through `parse`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::ToTarget => "to_target",
            Self::Acting => "acting",
            Self::ToDelivery => "to_delivery",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(Self::Idle),
            "searching" => Some(Self::Searching),
            "to_target" => Some(Self::ToTarget),
            "acting" => Some(Self::Acting),
            "to_delivery" => Some(Self::ToDelivery),
            _ => None,
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
