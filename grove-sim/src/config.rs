//! Simulation configuration loading.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use grove_agent::{HarvestProfile, HarvesterConfig};
use grove_grid::CellFilter;

/// Top-level configuration, loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World seed for spawn placement.
    pub seed: u64,

    /// What agents cut, traverse, and produce.
    pub profile: ProfileConfig,

    /// Tick-counted tuning constants.
    pub tuning: TuningConfig,
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        Ok(config)
    }
}

/// Cell-type vocabulary of the harvest domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub target_types: Vec<String>,
    pub target_tags: Vec<String>,
    pub passable_types: Vec<String>,
    pub unjumpable_types: Vec<String>,
    pub canopy_types: Vec<String>,
    pub dense_types: Vec<String>,
    /// Harvested type -> refined variant (credited when stripping).
    pub refined: BTreeMap<String, String>,
    /// Harvested type -> seed type replanted where the structure stood.
    pub seeds: BTreeMap<String, String>,
    pub soil_types: Vec<String>,
    pub anchor_type: String,
    pub container_type: String,
    pub cleared_type: String,
    pub min_canopy: usize,
    pub validate_cap: usize,
    pub harvest_cap: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            target_types: vec!["grove:trunk".into(), "grove:elder_trunk".into()],
            target_tags: Vec::new(),
            passable_types: vec![
                "grove:air".into(),
                "grove:canopy".into(),
                "grove:sprout".into(),
                "grove:tall_grass".into(),
            ],
            unjumpable_types: vec!["grove:fence".into(), "grove:wall".into()],
            canopy_types: vec!["grove:canopy".into()],
            dense_types: vec!["grove:elder_trunk".into()],
            refined: BTreeMap::from([
                ("grove:trunk".to_string(), "grove:bare_trunk".to_string()),
                (
                    "grove:elder_trunk".to_string(),
                    "grove:bare_elder_trunk".to_string(),
                ),
            ]),
            seeds: BTreeMap::from([
                ("grove:trunk".to_string(), "grove:sprout".to_string()),
                ("grove:elder_trunk".to_string(), "grove:sprout".to_string()),
            ]),
            soil_types: vec!["grove:loam".into(), "grove:sod".into()],
            anchor_type: "grove:post".into(),
            container_type: "grove:bin".into(),
            cleared_type: "grove:air".into(),
            min_canopy: 4,
            validate_cap: 100,
            harvest_cap: 75,
        }
    }
}

impl ProfileConfig {
    pub fn to_profile(&self) -> HarvestProfile {
        let mut filter = CellFilter::default();
        filter.target_types = self.target_types.iter().map(|t| t.clone().into()).collect();
        filter.target_tags = self.target_tags.iter().cloned().collect();
        filter.passable_types = self
            .passable_types
            .iter()
            .map(|t| t.clone().into())
            .collect();
        filter.unjumpable_types = self
            .unjumpable_types
            .iter()
            .map(|t| t.clone().into())
            .collect();

        let mut profile = HarvestProfile::new(
            filter,
            self.anchor_type.clone(),
            self.container_type.clone(),
            self.cleared_type.clone(),
        );
        profile.canopy_types = self.canopy_types.iter().map(|t| t.clone().into()).collect();
        profile.dense_types = self.dense_types.iter().map(|t| t.clone().into()).collect();
        profile.refined = self
            .refined
            .iter()
            .map(|(k, v)| (k.clone().into(), v.clone().into()))
            .collect();
        profile.seeds = self
            .seeds
            .iter()
            .map(|(k, v)| (k.clone().into(), v.clone().into()))
            .collect();
        profile.soil_types = self.soil_types.iter().map(|t| t.clone().into()).collect();
        profile.min_canopy = self.min_canopy;
        profile.validate_cap = self.validate_cap;
        profile.harvest_cap = self.harvest_cap;
        profile
    }
}

/// Tick-counted tuning constants (20 ticks per second).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,
    #[serde(default = "default_path_budget")]
    pub path_budget: u32,
    #[serde(default = "default_travel_speed")]
    pub travel_speed: f32,
    #[serde(default = "default_max_travel_failures")]
    pub max_travel_failures: u32,
    #[serde(default = "default_act_ticks")]
    pub act_ticks: u64,
    #[serde(default = "default_act_ticks_dense")]
    pub act_ticks_dense: u64,
    #[serde(default = "default_job_resumes")]
    pub job_resumes_per_tick: u32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            search_radius: default_search_radius(),
            path_budget: default_path_budget(),
            travel_speed: default_travel_speed(),
            max_travel_failures: default_max_travel_failures(),
            act_ticks: default_act_ticks(),
            act_ticks_dense: default_act_ticks_dense(),
            job_resumes_per_tick: default_job_resumes(),
        }
    }
}

impl TuningConfig {
    pub fn to_config(&self) -> HarvesterConfig {
        HarvesterConfig {
            default_search_radius: self.search_radius,
            path_budget: self.path_budget,
            travel_speed: self.travel_speed,
            max_travel_failures: self.max_travel_failures,
            act_ticks: self.act_ticks,
            act_ticks_dense: self.act_ticks_dense,
            job_resumes_per_tick: self.job_resumes_per_tick,
            ..HarvesterConfig::default()
        }
    }
}

fn default_search_radius() -> u32 {
    10
}

fn default_path_budget() -> u32 {
    300
}

fn default_travel_speed() -> f32 {
    1.0 / 6.0
}

fn default_max_travel_failures() -> u32 {
    4
}

fn default_act_ticks() -> u64 {
    100
}

fn default_act_ticks_dense() -> u64 {
    300
}

fn default_job_resumes() -> u32 {
    32
}
