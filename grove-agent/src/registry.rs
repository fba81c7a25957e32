use std::collections::BTreeMap;

use grove_core::{JobScheduler, TickContext};
use grove_grid::GridPos;
use thiserror::Error;
use tracing::debug;

use crate::{
    AgentJobs, HarvestProfile, HarvestWorld, Harvester, HarvesterConfig, SettingsUpdate,
    TickDirective,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("agent {0} is already registered")]
    DuplicateId(u64),
    #[error("anchor {0} already has a registered agent")]
    AnchorTaken(GridPos),
}

/// Owns every live agent and drives one tick per simulation step.
///
/// Replaces ambient static caches: all lookup goes through a registry
/// instance passed by reference. Invariant: the id map and the anchor index
/// are one-to-one.
pub struct AgentRegistry<W: HarvestWorld<Agent = u64>> {
    agents: BTreeMap<u64, Harvester>,
    /// Registration order; `tick` visits agents in this order.
    order: Vec<u64>,
    by_anchor: BTreeMap<GridPos, u64>,
    jobs: AgentJobs<W>,
    profile: HarvestProfile,
    config: HarvesterConfig,
}

impl<W: HarvestWorld<Agent = u64> + 'static> AgentRegistry<W> {
    pub fn new(profile: HarvestProfile, config: HarvesterConfig) -> Self {
        let jobs = JobScheduler::new(config.job_resumes_per_tick);
        Self {
            agents: BTreeMap::new(),
            order: Vec::new(),
            by_anchor: BTreeMap::new(),
            jobs,
            profile,
            config,
        }
    }

    pub fn profile(&self) -> &HarvestProfile {
        &self.profile
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    pub fn register(&mut self, agent: Harvester) -> Result<(), RegistryError> {
        if self.agents.contains_key(&agent.id()) {
            return Err(RegistryError::DuplicateId(agent.id()));
        }
        if self.by_anchor.contains_key(&agent.anchor()) {
            return Err(RegistryError::AnchorTaken(agent.anchor()));
        }

        debug!(agent = agent.id(), anchor = %agent.anchor(), "agent registered");
        self.by_anchor.insert(agent.anchor(), agent.id());
        self.order.push(agent.id());
        self.agents.insert(agent.id(), agent);
        Ok(())
    }

    /// Remove an agent and kill its external body. Idempotent: a second call
    /// for the same id has no additional effect.
    pub fn unregister(&mut self, world: &mut W, id: u64) {
        let Some(agent) = self.agents.remove(&id) else {
            return;
        };
        self.drop_record(world, &agent);
    }

    pub fn contains(&self, id: u64) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Harvester> {
        self.agents.get(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &Harvester> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    pub fn find_by_anchor(&self, pos: GridPos) -> Option<&Harvester> {
        self.by_anchor.get(&pos).and_then(|id| self.agents.get(id))
    }

    /// Apply a settings update to a registered agent; returns false for
    /// unknown ids.
    pub fn apply_settings(&mut self, world: &mut W, id: u64, update: SettingsUpdate) -> bool {
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        agent.apply_settings(world, update);
        true
    }

    /// Host notification that a manager block at `pos` was removed; cleans up
    /// any agent anchored there. Unknown locations are a no-op.
    pub fn on_manager_removed(&mut self, world: &mut W, pos: GridPos) {
        if let Some(&id) = self.by_anchor.get(&pos) {
            debug!(agent = id, anchor = %pos, "manager removed");
            self.unregister(world, id);
        }
    }

    /// Drive one simulation step: pump the shared job scheduler, then tick
    /// every agent in registration order.
    ///
    /// An agent that unregisters itself during its own tick is not revisited
    /// in the same pass and does not disturb iteration.
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        self.jobs.pump(world);

        let pass: Vec<u64> = self.order.clone();
        for id in pass {
            let Some(mut agent) = self.agents.remove(&id) else {
                continue;
            };
            match agent.tick(ctx, world, &mut self.jobs, &self.profile, &self.config) {
                TickDirective::Continue => {
                    self.agents.insert(id, agent);
                }
                TickDirective::Unregister => {
                    debug!(agent = id, "agent unregistered during its own tick");
                    self.drop_record(world, &agent);
                }
            }
        }
    }

    fn drop_record(&mut self, world: &mut W, agent: &Harvester) {
        if let Some(job) = agent.active_job() {
            self.jobs.cancel(job);
        }
        self.by_anchor.remove(&agent.anchor());
        self.order.retain(|&other| other != agent.id());
        world.kill_body(agent.id());
    }
}
