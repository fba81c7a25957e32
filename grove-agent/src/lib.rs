//! Harvester agent kernel: state machine, registry, and interaction gate.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod gate;
pub mod machine;
pub mod persist;
pub mod profile;
pub mod registry;
pub mod state;
pub mod task;
pub mod world;

pub use gate::InteractionGate;
pub use machine::{Harvester, SettingsUpdate, TickDirective};
pub use persist::{keys, PersistError, PersistedAgent};
pub use profile::{HarvestProfile, HarvesterConfig};
pub use registry::{AgentRegistry, RegistryError};
pub use state::AgentState;
pub use task::{AgentJobs, PlanTask, SearchTask, TaskOutput};
pub use world::{BodyFlag, HarvestWorld, PropValue};
