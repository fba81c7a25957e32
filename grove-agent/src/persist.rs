use grove_grid::GridPos;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{AgentState, HarvestWorld, PropValue};

/// Property keys of the persisted agent schema.
pub mod keys {
    pub const ID: &str = "grove:id";
    pub const STATE: &str = "grove:state";
    pub const SEARCH_RADIUS: &str = "grove:search_radius";
    pub const ENABLED: &str = "grove:enabled";
    pub const STRIP_OUTPUT: &str = "grove:strip_output";
    pub const ANCHOR_X: &str = "grove:anchor_x";
    pub const ANCHOR_Y: &str = "grove:anchor_y";
    pub const ANCHOR_Z: &str = "grove:anchor_z";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("missing required property `{0}`")]
    MissingKey(&'static str),
    #[error("property `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("unknown state name `{0}`")]
    UnknownState(String),
}

/// The fixed, typed schema an agent is reconstructed from after a reload.
///
/// Every field is an individually-addressable entry in the external entity's
/// key/value store. Optional fields load with explicit defaults; an entity
/// without an id or anchor cannot be operated and fails to load.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PersistedAgent {
    pub id: u64,
    pub state: AgentState,
    pub search_radius: Option<u32>,
    pub enabled: bool,
    pub strip_output: bool,
    pub anchor: GridPos,
}

impl PersistedAgent {
    pub fn load<W: HarvestWorld>(world: &W, agent: W::Agent) -> Result<Self, PersistError> {
        let id = require_int(world, agent, keys::ID)?;
        if id < 0 {
            return Err(PersistError::WrongType(keys::ID));
        }

        let state = match world.property(agent, keys::STATE) {
            None => AgentState::Idle,
            Some(PropValue::Text(name)) => {
                AgentState::parse(&name).ok_or(PersistError::UnknownState(name))?
            }
            Some(_) => return Err(PersistError::WrongType(keys::STATE)),
        };

        let search_radius = match world.property(agent, keys::SEARCH_RADIUS) {
            None => None,
            Some(PropValue::Int(r)) if r >= 0 => Some(r as u32),
            Some(_) => return Err(PersistError::WrongType(keys::SEARCH_RADIUS)),
        };

        Ok(Self {
            id: id as u64,
            state,
            search_radius,
            enabled: optional_bool(world, agent, keys::ENABLED, true)?,
            strip_output: optional_bool(world, agent, keys::STRIP_OUTPUT, true)?,
            anchor: GridPos::new(
                require_int(world, agent, keys::ANCHOR_X)? as i32,
                require_int(world, agent, keys::ANCHOR_Y)? as i32,
                require_int(world, agent, keys::ANCHOR_Z)? as i32,
            ),
        })
    }

    pub fn store<W: HarvestWorld>(&self, world: &mut W, agent: W::Agent) {
        world.set_property(agent, keys::ID, PropValue::Int(self.id as i64));
        world.set_property(
            agent,
            keys::STATE,
            PropValue::Text(self.state.as_str().to_string()),
        );
        if let Some(radius) = self.search_radius {
            world.set_property(agent, keys::SEARCH_RADIUS, PropValue::Int(radius as i64));
        }
        world.set_property(agent, keys::ENABLED, PropValue::Bool(self.enabled));
        world.set_property(agent, keys::STRIP_OUTPUT, PropValue::Bool(self.strip_output));
        world.set_property(agent, keys::ANCHOR_X, PropValue::Int(self.anchor.x as i64));
        world.set_property(agent, keys::ANCHOR_Y, PropValue::Int(self.anchor.y as i64));
        world.set_property(agent, keys::ANCHOR_Z, PropValue::Int(self.anchor.z as i64));
    }
}

fn require_int<W: HarvestWorld>(
    world: &W,
    agent: W::Agent,
    key: &'static str,
) -> Result<i64, PersistError> {
    match world.property(agent, key) {
        Some(PropValue::Int(value)) => Ok(value),
        Some(_) => Err(PersistError::WrongType(key)),
        None => Err(PersistError::MissingKey(key)),
    }
}

fn optional_bool<W: HarvestWorld>(
    world: &W,
    agent: W::Agent,
    key: &'static str,
    default: bool,
) -> Result<bool, PersistError> {
    match world.property(agent, key) {
        None => Ok(default),
        Some(PropValue::Bool(value)) => Ok(value),
        Some(_) => Err(PersistError::WrongType(key)),
    }
}
