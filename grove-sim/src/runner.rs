//! Tick runner wiring the registry, world, and host events together.

use std::collections::BTreeMap;

use grove_agent::{AgentRegistry, HarvestWorld, Harvester, InteractionGate, PersistedAgent};
use grove_core::TickContext;
use grove_grid::GridPos;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{find_spawn_spot, MapWorld, SimConfig, SimEvent};

/// Debounce window for player interactions.
pub const INTERACT_WINDOW_MS: u64 = 350;

/// The host loop: drives the registry once per step and routes events.
pub struct Simulation {
    pub world: MapWorld,
    pub registry: AgentRegistry<MapWorld>,
    gate: InteractionGate,
    config: SimConfig,
    tick: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, world: MapWorld) -> Self {
        let registry =
            AgentRegistry::new(config.profile.to_profile(), config.tuning.to_config());
        Self {
            world,
            registry,
            gate: InteractionGate::new(),
            config,
            tick: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn handle(&mut self, event: SimEvent) {
        match event {
            SimEvent::ManagerPlaced { pos } => self.place_manager(pos),
            SimEvent::ManagerBroken { pos } => {
                self.world.put(pos, self.config.profile.cleared_type.clone());
                self.registry.on_manager_removed(&mut self.world, pos);
            }
            SimEvent::BodyLoaded { id } => self.load_body(id),
            SimEvent::Interact {
                player,
                pos,
                at_ms,
                update,
            } => {
                if self.gate.is_debounced(player, at_ms, INTERACT_WINDOW_MS) {
                    debug!(player, "interaction debounced");
                    return;
                }
                self.gate.debounce(player, at_ms);

                let Some(id) = self.registry.find_by_anchor(pos).map(Harvester::id) else {
                    debug!(pos = %pos, "interaction on a post with no agent");
                    return;
                };
                self.registry.apply_settings(&mut self.world, id, update);
            }
        }
    }

    fn place_manager(&mut self, pos: GridPos) {
        self.world.put(pos, self.config.profile.anchor_type.clone());

        let cleared = self.config.profile.cleared_type.clone().into();
        let Some(spot) = find_spawn_spot(&self.world, pos, &cleared, self.config.seed) else {
            return;
        };

        let id = self.world.allocate_agent_id();
        self.world.spawn_body(id, spot);

        let agent = Harvester::new(id, pos);
        agent.store(&mut self.world);
        match self.registry.register(agent) {
            Ok(()) => info!(agent = id, anchor = %pos, "harvester spawned"),
            Err(err) => {
                warn!(agent = id, %err, "could not register spawned harvester");
                self.world.kill_body(id);
            }
        }
    }

    /// Reload path: reconstruct an agent from its persisted schema. A body
    /// that fails validation cannot be operated and is removed.
    fn load_body(&mut self, id: u64) {
        if self.registry.contains(id) {
            return;
        }

        match PersistedAgent::load(&self.world, id) {
            Ok(record) => {
                let agent = Harvester::from_persisted(&record);
                if let Err(err) = self.registry.register(agent) {
                    warn!(agent = id, %err, "could not register loaded harvester");
                    self.world.kill_body(id);
                }
            }
            Err(err) => {
                warn!(agent = id, %err, "unloadable harvester body, removing");
                self.world.kill_body(id);
            }
        }
    }

    pub fn step(&mut self) {
        self.world.step_movement();
        let ctx = TickContext {
            tick: self.tick,
            seed: self.config.seed,
        };
        self.registry.tick(&ctx, &mut self.world);
        self.tick += 1;
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
        info!(
            ticks = self.tick,
            agents = self.registry.len(),
            "run complete"
        );
    }

    pub fn summary(&self) -> RunSummary {
        let mut carried = BTreeMap::new();
        for agent in self.registry.agents() {
            for (resource, amount) in agent.carrying() {
                *carried.entry(resource.to_string()).or_insert(0) += *amount;
            }
        }

        RunSummary {
            ticks: self.tick,
            agents: self.registry.len(),
            carried,
            delivered: self.world.delivered_totals(),
        }
    }
}

/// End-of-run totals, serializable for tooling.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub agents: usize,
    pub carried: BTreeMap<String, u64>,
    pub delivered: BTreeMap<String, u64>,
}
