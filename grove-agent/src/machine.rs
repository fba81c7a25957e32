use std::collections::{BTreeMap, BTreeSet};

use grove_core::{JobId, TickContext};
use grove_grid::{
    connected_component, CellKind, CellTypeId, GridPos, PathSpec, RegionSearchSpec,
};
use tracing::{debug, warn};

use crate::persist::keys;
use crate::{
    AgentJobs, AgentState, BodyFlag, HarvestProfile, HarvestWorld, HarvesterConfig,
    PersistedAgent, PlanTask, PropValue, SearchTask, TaskOutput,
};

/// What the registry should do with the agent after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDirective {
    Continue,
    /// The agent can no longer operate (its anchor is gone) and must be
    /// unregistered and its body removed.
    Unregister,
}

/// Settings applied from an accepted player interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub search_radius: Option<u32>,
    pub strip_output: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Target(GridPos),
    Delivery(GridPos),
}

/// The asynchronous work in flight for one agent. While a phase exists the
/// readiness flag is false and ticks only poll it; exactly one phase can be
/// in flight per agent.
#[derive(Debug)]
enum Phase {
    Search { job: JobId },
    Plan { job: JobId, dest: Destination },
    Travel { dest: Destination },
    Act { until: u64 },
    Hold { until: u64, then: AgentState },
}

/// One autonomous harvester cycling search → travel → act → travel → deliver.
///
/// All failure recovery is local: backoff holds and state re-pointing, never
/// an error out of `tick`.
pub struct Harvester {
    id: u64,
    state: AgentState,
    ready: bool,
    phase: Option<Phase>,
    /// Tick before which the agent does nothing (invalid body / disabled).
    pause_until: u64,
    target: Option<GridPos>,
    carrying: BTreeMap<CellTypeId, u64>,
    travel_failures: u32,
    /// Candidates rejected since the last successful acquisition; cleared on
    /// every success and only ever grows otherwise.
    ignored: BTreeSet<GridPos>,
    anchor: GridPos,
    enabled: bool,
    strip_output: bool,
    search_radius: Option<u32>,
}

impl Harvester {
    /// A freshly spawned agent, idle and ready.
    pub fn new(id: u64, anchor: GridPos) -> Self {
        Self {
            id,
            state: AgentState::Idle,
            ready: true,
            phase: None,
            pause_until: 0,
            target: None,
            carrying: BTreeMap::new(),
            travel_failures: 0,
            ignored: BTreeSet::new(),
            anchor,
            enabled: true,
            strip_output: true,
            search_radius: None,
        }
    }

    /// Reconstruct an agent from its persisted schema.
    ///
    /// The cycle restarts from `Idle`: whatever phase was in flight died with
    /// the previous session, and no stage can be resumed without its entry
    /// preconditions.
    pub fn from_persisted(record: &PersistedAgent) -> Self {
        let mut agent = Self::new(record.id, record.anchor);
        agent.enabled = record.enabled;
        agent.strip_output = record.strip_output;
        agent.search_radius = record.search_radius;
        agent
    }

    pub fn persisted(&self) -> PersistedAgent {
        PersistedAgent {
            id: self.id,
            state: self.state,
            search_radius: self.search_radius,
            enabled: self.enabled,
            strip_output: self.strip_output,
            anchor: self.anchor,
        }
    }

    /// Write the full persisted schema onto the external entity.
    pub fn store<W: HarvestWorld<Agent = u64>>(&self, world: &mut W) {
        self.persisted().store(world, self.id);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn anchor(&self) -> GridPos {
        self.anchor
    }

    pub fn target(&self) -> Option<GridPos> {
        self.target
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn carrying(&self) -> &BTreeMap<CellTypeId, u64> {
        &self.carrying
    }

    pub fn ignored(&self) -> &BTreeSet<GridPos> {
        &self.ignored
    }

    pub fn travel_failures(&self) -> u32 {
        self.travel_failures
    }

    pub(crate) fn active_job(&self) -> Option<JobId> {
        match self.phase {
            Some(Phase::Search { job }) | Some(Phase::Plan { job, .. }) => Some(job),
            _ => None,
        }
    }

    /// Apply an accepted settings interaction and persist the changed keys.
    pub fn apply_settings<W: HarvestWorld<Agent = u64>>(
        &mut self,
        world: &mut W,
        update: SettingsUpdate,
    ) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
            world.set_property(self.id, keys::ENABLED, PropValue::Bool(enabled));
        }
        if let Some(radius) = update.search_radius {
            self.search_radius = Some(radius);
            world.set_property(self.id, keys::SEARCH_RADIUS, PropValue::Int(radius as i64));
        }
        if let Some(strip) = update.strip_output {
            self.strip_output = strip;
            world.set_property(self.id, keys::STRIP_OUTPUT, PropValue::Bool(strip));
        }
    }

    /// One simulation step. Called by the registry; never call re-entrantly.
    pub fn tick<W: HarvestWorld<Agent = u64> + 'static>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        jobs: &mut AgentJobs<W>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) -> TickDirective {
        if ctx.tick < self.pause_until {
            return TickDirective::Continue;
        }

        // An invalid body pauses the cycle without transitioning; the agent
        // resumes exactly where it was once the body is valid again.
        if !world.body_is_valid(self.id) {
            debug!(agent = self.id, "body invalid, pausing");
            self.pause_until = ctx.tick + config.disabled_ticks;
            return TickDirective::Continue;
        }

        if !self.enabled {
            self.pause_until = ctx.tick + config.disabled_ticks;
            return TickDirective::Continue;
        }

        if !self.ready {
            self.poll_phase(ctx, world, jobs, profile, config);
            return TickDirective::Continue;
        }

        self.advance(ctx, world, jobs, profile, config)
    }

    /// Fire the single transition of this tick and run the entry action of
    /// the successor stage.
    fn advance<W: HarvestWorld<Agent = u64> + 'static>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        jobs: &mut AgentJobs<W>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) -> TickDirective {
        let next = self.state.successor();
        self.set_state(world, next);
        debug!(agent = self.id, state = %next, "entering stage");

        match next {
            AgentState::Idle => {
                self.travel_failures = 0;
                // Immediate: the agent stays ready and searches next tick.
                TickDirective::Continue
            }
            AgentState::Searching => self.enter_search(ctx, world, jobs, profile, config),
            AgentState::ToTarget => {
                self.enter_travel_to_target(world, jobs, profile, config);
                TickDirective::Continue
            }
            AgentState::Acting => {
                self.enter_act(ctx, world, profile, config);
                TickDirective::Continue
            }
            AgentState::ToDelivery => {
                self.enter_delivery(ctx, world, jobs, profile, config);
                TickDirective::Continue
            }
        }
    }

    fn enter_search<W: HarvestWorld<Agent = u64> + 'static>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        jobs: &mut AgentJobs<W>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) -> TickDirective {
        match world.cell(self.anchor) {
            Err(_) => {
                // Anchor region not resident; hold for a long while.
                debug!(agent = self.id, "anchor unloaded, holding");
                self.begin_hold(ctx, config.unloaded_anchor_ticks, AgentState::Idle);
                return TickDirective::Continue;
            }
            Ok(Some(cell)) if cell.type_id == profile.anchor_type => {}
            Ok(_) => {
                // The anchor block is gone and the removal event was missed.
                warn!(agent = self.id, anchor = %self.anchor, "anchor gone, unregistering");
                return TickDirective::Unregister;
            }
        }

        let radius = self.search_radius.unwrap_or(config.default_search_radius);
        let mut spec = RegionSearchSpec::new(self.anchor, radius, profile.filter.clone());
        spec.ignored = self.ignored.clone();

        let job = jobs.start(Box::new(SearchTask::new(spec)));
        self.phase = Some(Phase::Search { job });
        self.ready = false;
        TickDirective::Continue
    }

    fn enter_travel_to_target<W: HarvestWorld<Agent = u64> + 'static>(
        &mut self,
        world: &mut W,
        jobs: &mut AgentJobs<W>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        let Some(target) = self.target else {
            // Nothing to walk to; restart the cycle.
            self.set_state(world, AgentState::Idle);
            return;
        };
        let Some(start) = world.body_location(self.id) else {
            self.set_state(world, AgentState::Idle);
            return;
        };

        let mut spec = PathSpec::new(start, target, profile.filter.clone());
        spec.max_expansions = config.path_budget;
        spec.arrive_radius = config.arrive_radius;

        world.set_body_flag(self.id, BodyFlag::Moving, true);
        let job = jobs.start(Box::new(PlanTask::new(spec)));
        self.phase = Some(Phase::Plan {
            job,
            dest: Destination::Target(target),
        });
        self.ready = false;
    }

    fn enter_act<W: HarvestWorld<Agent = u64>>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        let Some(target) = self.target else {
            self.set_state(world, AgentState::Idle);
            return;
        };

        let dense = match world.cell(target) {
            Ok(Some(cell)) if profile.filter.classify(&cell) == CellKind::Target => {
                profile.is_dense(&cell.type_id)
            }
            // Invalidated or unloaded before the work even started.
            _ => {
                debug!(agent = self.id, "target invalid at act entry");
                self.begin_hold(ctx, config.travel_retry_ticks, AgentState::Idle);
                return;
            }
        };

        let duration = if dense {
            config.act_ticks_dense
        } else {
            config.act_ticks
        };
        world.set_body_flag(self.id, BodyFlag::Acting, true);
        self.phase = Some(Phase::Act {
            until: ctx.tick + duration,
        });
        self.ready = false;
    }

    fn enter_delivery<W: HarvestWorld<Agent = u64> + 'static>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        jobs: &mut AgentJobs<W>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        let container = match self.find_container(world, profile) {
            Some(pos) => pos,
            None => {
                debug!(agent = self.id, "no delivery container, holding");
                self.begin_hold(ctx, config.delivery_retry_ticks, AgentState::Acting);
                return;
            }
        };
        let Some(start) = world.body_location(self.id) else {
            self.begin_hold(ctx, config.delivery_retry_ticks, AgentState::Acting);
            return;
        };

        let mut spec = PathSpec::new(start, container, profile.filter.clone());
        spec.max_expansions = config.path_budget;
        spec.arrive_radius = config.arrive_radius;

        world.set_body_flag(self.id, BodyFlag::Moving, true);
        let job = jobs.start(Box::new(PlanTask::new(spec)));
        self.phase = Some(Phase::Plan {
            job,
            dest: Destination::Delivery(container),
        });
        self.ready = false;
    }

    /// Poll the in-flight phase; a completing phase restores readiness (or
    /// re-points the state for a retry). Never fires a transition.
    fn poll_phase<W: HarvestWorld<Agent = u64> + 'static>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        jobs: &mut AgentJobs<W>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        let Some(phase) = self.phase.take() else {
            // Not ready with nothing in flight is unreachable; recover by
            // resetting this agent's cycle only.
            warn!(agent = self.id, "readiness lost with no phase, resetting");
            self.reset_cycle(world);
            return;
        };

        match phase {
            Phase::Hold { until, then } => {
                if ctx.tick < until {
                    self.phase = Some(Phase::Hold { until, then });
                    return;
                }
                self.set_state(world, then);
                self.ready = true;
            }
            Phase::Search { job } => match jobs.try_take(job) {
                None => self.phase = Some(Phase::Search { job }),
                Some(TaskOutput::Search(result)) => {
                    self.finish_search(ctx, world, result, profile, config);
                }
                Some(TaskOutput::Path(_)) => {
                    warn!(agent = self.id, "search job produced a path, resetting");
                    self.reset_cycle(world);
                }
            },
            Phase::Plan { job, dest } => match jobs.try_take(job) {
                None => self.phase = Some(Phase::Plan { job, dest }),
                Some(TaskOutput::Path(Some(path))) => {
                    world.begin_move(self.id, path, config.travel_speed);
                    self.phase = Some(Phase::Travel { dest });
                }
                Some(TaskOutput::Path(None)) => {
                    debug!(agent = self.id, "no path to destination");
                    world.set_body_flag(self.id, BodyFlag::Moving, false);
                    self.travel_failed(ctx, dest, config);
                }
                Some(TaskOutput::Search(_)) => {
                    warn!(agent = self.id, "plan job produced a search result, resetting");
                    self.reset_cycle(world);
                }
            },
            Phase::Travel { dest } => match world.poll_move(self.id) {
                None => self.phase = Some(Phase::Travel { dest }),
                Some(true) => {
                    world.set_body_flag(self.id, BodyFlag::Moving, false);
                    match dest {
                        Destination::Target(_) => self.ready = true,
                        Destination::Delivery(container) => {
                            self.finish_delivery(ctx, world, container, profile, config);
                        }
                    }
                }
                Some(false) => {
                    debug!(agent = self.id, "movement did not reach destination");
                    world.set_body_flag(self.id, BodyFlag::Moving, false);
                    self.travel_failed(ctx, dest, config);
                }
            },
            Phase::Act { until } => {
                if ctx.tick < until {
                    self.phase = Some(Phase::Act { until });
                    return;
                }
                world.set_body_flag(self.id, BodyFlag::Acting, false);
                self.finish_act(ctx, world, profile, config);
            }
        }
    }

    fn finish_search<W: HarvestWorld<Agent = u64>>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        result: Option<GridPos>,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        let Some(candidate) = result else {
            debug!(agent = self.id, "search found nothing");
            self.begin_hold(ctx, config.search_miss_ticks, AgentState::Idle);
            return;
        };

        match validate_structure(world, candidate, profile) {
            Err(_) => {
                // Unloaded mid-validation; try the whole search again later.
                self.begin_hold(ctx, config.travel_retry_ticks, AgentState::Idle);
            }
            Ok(true) => {
                debug!(agent = self.id, target = %candidate, "target acquired");
                self.target = Some(candidate);
                self.ignored.clear();
                self.ready = true;
            }
            Ok(false) => {
                debug!(agent = self.id, candidate = %candidate, "candidate rejected");
                self.ignored.insert(candidate);
                self.begin_hold(ctx, config.rejected_target_ticks, AgentState::Idle);
            }
        }
    }

    fn travel_failed(&mut self, ctx: &TickContext, dest: Destination, config: &HarvesterConfig) {
        match dest {
            Destination::Target(_) => {
                self.travel_failures += 1;
                if self.travel_failures > config.max_travel_failures {
                    debug!(agent = self.id, "too many travel failures, resetting cycle");
                    self.travel_failures = 0;
                    self.begin_hold(ctx, config.travel_retry_ticks, AgentState::Idle);
                } else {
                    // Retry the walk with the same target.
                    self.begin_hold(ctx, config.travel_retry_ticks, AgentState::Searching);
                }
            }
            Destination::Delivery(_) => {
                // Carried resources are retained; delivery is retried.
                self.begin_hold(ctx, config.delivery_retry_ticks, AgentState::Acting);
            }
        }
    }

    fn finish_act<W: HarvestWorld<Agent = u64>>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        let Some(target) = self.target else {
            self.reset_cycle(world);
            return;
        };

        // The world may have changed underneath the timer; re-validate.
        let harvested = match world.cell(target) {
            Ok(Some(cell)) if profile.filter.classify(&cell) == CellKind::Target => cell.type_id,
            _ => {
                debug!(agent = self.id, "target invalidated mid-action");
                self.begin_hold(ctx, config.travel_retry_ticks, AgentState::Idle);
                return;
            }
        };

        let component = match connected_component(
            world,
            target,
            &profile.filter.target_types,
            profile.harvest_cap,
        ) {
            Ok(cells) => cells,
            Err(_) => {
                debug!(agent = self.id, "structure unloaded mid-harvest");
                self.begin_hold(ctx, config.travel_retry_ticks, AgentState::Idle);
                return;
            }
        };

        let yield_type = profile.yield_for(&harvested, self.strip_output);
        *self.carrying.entry(yield_type).or_insert(0) += component.len() as u64;

        let dense = profile.is_dense(&harvested);
        // Dense clusters reseed where the felled bases stood; find those
        // before the cells are cleared.
        let bases: Vec<GridPos> = if dense {
            component
                .iter()
                .copied()
                .filter(|p| on_soil(world, *p, profile))
                .take(4)
                .collect()
        } else {
            Vec::new()
        };

        for &pos in &component {
            world.set_cell(pos, profile.cleared_type.clone());
        }
        debug!(
            agent = self.id,
            cells = component.len(),
            "structure felled"
        );

        reseed(world, target, &harvested, dense, &bases, profile);
        self.ready = true;
    }

    fn finish_delivery<W: HarvestWorld<Agent = u64>>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        container: GridPos,
        profile: &HarvestProfile,
        config: &HarvesterConfig,
    ) {
        match world.cell(container) {
            Ok(Some(cell)) if cell.type_id == profile.container_type => {}
            _ => {
                // The container vanished while we walked; retry delivery.
                debug!(agent = self.id, "container gone on arrival");
                self.begin_hold(ctx, config.delivery_retry_ticks, AgentState::Acting);
                return;
            }
        }

        let carried = std::mem::take(&mut self.carrying);
        for (resource, amount) in carried {
            let accepted = world.deposit(container, &resource, amount);
            let rejected = amount - accepted;
            if rejected > 0 {
                // Never dropped: whatever the container refuses rides along.
                self.carrying.insert(resource, rejected);
            }
        }
        debug!(agent = self.id, "delivery complete");
        self.ready = true;
    }

    fn find_container<W: HarvestWorld<Agent = u64>>(
        &self,
        world: &W,
        profile: &HarvestProfile,
    ) -> Option<GridPos> {
        // The 3x3 ring around the anchor at anchor height; nine bounded
        // lookups, so no cooperative job is needed here.
        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                let pos = self.anchor.offset(dx, 0, dz);
                if let Ok(Some(cell)) = world.cell(pos) {
                    if cell.type_id == profile.container_type {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    fn begin_hold(&mut self, ctx: &TickContext, ticks: u64, then: AgentState) {
        self.phase = Some(Phase::Hold {
            until: ctx.tick + ticks,
            then,
        });
        self.ready = false;
    }

    fn reset_cycle<W: HarvestWorld<Agent = u64>>(&mut self, world: &mut W) {
        self.phase = None;
        world.set_body_flag(self.id, BodyFlag::Moving, false);
        world.set_body_flag(self.id, BodyFlag::Acting, false);
        self.set_state(world, AgentState::Idle);
        self.ready = true;
    }

    fn set_state<W: HarvestWorld<Agent = u64>>(&mut self, world: &mut W, state: AgentState) {
        self.state = state;
        if world.body_is_valid(self.id) {
            world.set_property(
                self.id,
                keys::STATE,
                PropValue::Text(state.as_str().to_string()),
            );
        }
    }
}

/// A qualifying cell must actually be a harvestable structure: still
/// target-classified, and connected to enough canopy cells through its own
/// type plus the canopy types.
fn validate_structure<W: grove_grid::CellView + ?Sized>(
    world: &W,
    candidate: GridPos,
    profile: &HarvestProfile,
) -> Result<bool, grove_grid::CellError> {
    let Some(cell) = world.cell(candidate)? else {
        return Ok(false);
    };
    if profile.filter.classify(&cell) != CellKind::Target {
        return Ok(false);
    }

    let mut types = profile.canopy_types.clone();
    types.insert(cell.type_id.clone());
    let component = connected_component(world, candidate, &types, profile.validate_cap)?;

    let mut canopy = 0usize;
    for &pos in &component {
        if let Some(member) = world.cell(pos)? {
            if profile.canopy_types.contains(&member.type_id) {
                canopy += 1;
            }
        }
    }
    Ok(canopy >= profile.min_canopy)
}

/// Put a seed back where the structure stood. Dense clusters reseed their
/// felled base cells; everything else probes straight down for soil and
/// plants on top of it.
fn reseed<W: HarvestWorld<Agent = u64>>(
    world: &mut W,
    origin: GridPos,
    harvested: &CellTypeId,
    dense: bool,
    bases: &[GridPos],
    profile: &HarvestProfile,
) {
    let Some(seed) = profile.seeds.get(harvested) else {
        return;
    };

    if dense {
        for &base in bases {
            world.set_cell(base, seed.clone());
        }
        return;
    }

    let mut probe = origin.below();
    for _ in 0..5 {
        match world.cell(probe) {
            Ok(Some(cell)) if profile.soil_types.contains(&cell.type_id) => {
                world.set_cell(probe.above(), seed.clone());
                return;
            }
            Ok(Some(cell)) if cell.type_id == profile.cleared_type => {
                probe = probe.below();
            }
            _ => return,
        }
    }
}

fn on_soil<W: grove_grid::CellView + ?Sized>(world: &W, pos: GridPos, profile: &HarvestProfile) -> bool {
    matches!(
        world.cell(pos.below()),
        Ok(Some(ref cell)) if profile.soil_types.contains(&cell.type_id)
    )
}
