use std::collections::{BTreeMap, BTreeSet};

use grove_grid::{CellFilter, CellTypeId};

/// What a harvester cuts, traverses, and produces.
///
/// The filter's target types are the harvestable structure types; canopy
/// types are the decorator cells a real structure must be connected to
/// (an isolated trunk in someone's wall is not a tree).
#[derive(Debug, Clone)]
pub struct HarvestProfile {
    pub filter: CellFilter,
    /// Decorator types counted by the post-discovery connectivity check.
    pub canopy_types: BTreeSet<CellTypeId>,
    /// Target subtypes that take longer to fell and reseed cluster bases.
    pub dense_types: BTreeSet<CellTypeId>,
    /// Harvested type -> refined variant, used when the strip flag is set.
    pub refined: BTreeMap<CellTypeId, CellTypeId>,
    /// Harvested type -> seed type planted where the structure stood.
    pub seeds: BTreeMap<CellTypeId, CellTypeId>,
    /// Support types a seed may be planted on.
    pub soil_types: BTreeSet<CellTypeId>,
    /// The manager block type agents are anchored to.
    pub anchor_type: CellTypeId,
    /// The delivery container type searched for beside the anchor.
    pub container_type: CellTypeId,
    /// What felled cells become.
    pub cleared_type: CellTypeId,
    /// Minimum connected decorator cells for a candidate to qualify.
    pub min_canopy: usize,
    /// Cell cap of the validation fill.
    pub validate_cap: usize,
    /// Cell cap of the harvest fill.
    pub harvest_cap: usize,
}

impl HarvestProfile {
    pub fn new(
        filter: CellFilter,
        anchor_type: impl Into<CellTypeId>,
        container_type: impl Into<CellTypeId>,
        cleared_type: impl Into<CellTypeId>,
    ) -> Self {
        Self {
            filter,
            canopy_types: BTreeSet::new(),
            dense_types: BTreeSet::new(),
            refined: BTreeMap::new(),
            seeds: BTreeMap::new(),
            soil_types: BTreeSet::new(),
            anchor_type: anchor_type.into(),
            container_type: container_type.into(),
            cleared_type: cleared_type.into(),
            min_canopy: 4,
            validate_cap: 100,
            harvest_cap: 75,
        }
    }

    pub fn is_dense(&self, type_id: &CellTypeId) -> bool {
        self.dense_types.contains(type_id)
    }

    /// Resource credited for one harvested cell of `harvested`.
    pub fn yield_for(&self, harvested: &CellTypeId, strip: bool) -> CellTypeId {
        if strip {
            if let Some(refined) = self.refined.get(harvested) {
                return refined.clone();
            }
        }
        harvested.clone()
    }
}

/// Tick-counted tuning constants (20 ticks per second).
#[derive(Debug, Clone, PartialEq)]
pub struct HarvesterConfig {
    pub default_search_radius: u32,
    /// Node-expansion budget handed to the path planner.
    pub path_budget: u32,
    pub arrive_radius: u32,
    /// Fraction of full movement speed while traveling.
    pub travel_speed: f32,
    /// Consecutive travel failures tolerated before a full reset.
    pub max_travel_failures: u32,
    pub act_ticks: u64,
    pub act_ticks_dense: u64,
    pub travel_retry_ticks: u64,
    pub search_miss_ticks: u64,
    pub rejected_target_ticks: u64,
    pub delivery_retry_ticks: u64,
    /// Hold applied while disabled or while the body is invalid.
    pub disabled_ticks: u64,
    /// Hold applied while the anchor's region is unloaded.
    pub unloaded_anchor_ticks: u64,
    /// Scheduler resume budget per job per tick.
    pub job_resumes_per_tick: u32,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            default_search_radius: 10,
            path_budget: 300,
            arrive_radius: 1,
            travel_speed: 1.0 / 6.0,
            max_travel_failures: 4,
            act_ticks: 100,
            act_ticks_dense: 300,
            travel_retry_ticks: 150,
            search_miss_ticks: 200,
            rejected_target_ticks: 300,
            delivery_retry_ticks: 200,
            disabled_ticks: 600,
            unloaded_anchor_ticks: 1800,
            job_resumes_per_tick: 32,
        }
    }
}
