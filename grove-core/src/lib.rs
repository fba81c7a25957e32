//! Deterministic, engine-agnostic agent kernel primitives.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod job;
pub mod rng;
pub mod tick;
pub mod world;

pub use agent::AgentId;
pub use job::{Job, JobId, JobProgress, JobScheduler};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::{TickContext, TICKS_PER_SECOND};
pub use world::{WorldMut, WorldView};
