//! Reference voxel world and simulation harness for grove agents.
//!
//! This crate stands in for the host simulation: an in-memory world
//! implementing every external interface the agent kernel consumes, plus
//! event plumbing, YAML configuration, and a tick runner.

#![forbid(unsafe_code)]

pub mod config;
pub mod events;
pub mod runner;
pub mod spawn;
pub mod world;

pub use config::{ProfileConfig, SimConfig, TuningConfig};
pub use events::SimEvent;
pub use runner::{RunSummary, Simulation};
pub use spawn::find_spawn_spot;
pub use world::MapWorld;
