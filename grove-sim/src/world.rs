//! In-memory voxel world implementing the agent kernel's external seams.

use std::collections::{BTreeMap, BTreeSet};

use grove_agent::{BodyFlag, HarvestWorld, PropValue};
use grove_core::{WorldMut, WorldView};
use grove_grid::{CellError, CellSnapshot, CellTypeId, CellView, GridPos, PlannedPath};

/// Chunk edge length is 16 cells; unloading is chunk-granular.
fn chunk_of(pos: GridPos) -> (i32, i32) {
    (pos.x >> 4, pos.z >> 4)
}

#[derive(Debug, Clone)]
struct Walk {
    cells: Vec<GridPos>,
    next: usize,
    speed: f32,
    progress: f32,
}

#[derive(Debug, Clone)]
struct Body {
    pos: GridPos,
    flags: BTreeSet<BodyFlag>,
    walk: Option<Walk>,
    /// Latched movement result, consumed by `poll_move`.
    arrived: Option<bool>,
}

#[derive(Debug, Clone, Default)]
struct Container {
    slots: BTreeMap<CellTypeId, u64>,
    capacity: u64,
}

/// Flat bounded voxel plane: soil floor at y = -1, air above, overridden
/// cells on top. Movement is tick-stepped along planned paths at a speed
/// fraction, with completion reported asynchronously through `poll_move`.
pub struct MapWorld {
    cells: BTreeMap<GridPos, CellTypeId>,
    tags: BTreeMap<CellTypeId, Vec<String>>,
    air: CellTypeId,
    floor: CellTypeId,
    bound: i32,
    max_y: i32,
    unloaded_chunks: BTreeSet<(i32, i32)>,
    bodies: BTreeMap<u64, Body>,
    props: BTreeMap<(u64, String), PropValue>,
    containers: BTreeMap<GridPos, Container>,
    /// World-scoped id counter; ids are allocated once and never reused.
    next_agent_id: u64,
}

impl MapWorld {
    pub fn new(bound: i32) -> Self {
        Self {
            cells: BTreeMap::new(),
            tags: BTreeMap::new(),
            air: "grove:air".into(),
            floor: "grove:loam".into(),
            bound,
            max_y: 16,
            unloaded_chunks: BTreeSet::new(),
            bodies: BTreeMap::new(),
            props: BTreeMap::new(),
            containers: BTreeMap::new(),
            next_agent_id: 1,
        }
    }

    pub fn put(&mut self, pos: GridPos, type_id: impl Into<CellTypeId>) {
        self.cells.insert(pos, type_id.into());
    }

    pub fn type_at(&self, pos: GridPos) -> Option<&CellTypeId> {
        self.cells.get(&pos)
    }

    pub fn register_tags(&mut self, type_id: impl Into<CellTypeId>, tags: Vec<String>) {
        self.tags.insert(type_id.into(), tags);
    }

    /// Place a container block; `put` the matching cell type separately.
    pub fn place_container(&mut self, pos: GridPos, capacity: u64) {
        self.containers.insert(
            pos,
            Container {
                slots: BTreeMap::new(),
                capacity,
            },
        );
    }

    pub fn container_stock(&self, pos: GridPos, resource: &CellTypeId) -> u64 {
        self.containers
            .get(&pos)
            .and_then(|c| c.slots.get(resource))
            .copied()
            .unwrap_or(0)
    }

    /// Total deposited resources across all containers, keyed by type name.
    pub fn delivered_totals(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for container in self.containers.values() {
            for (resource, amount) in &container.slots {
                *totals.entry(resource.to_string()).or_insert(0) += *amount;
            }
        }
        totals
    }

    pub fn set_chunk_loaded(&mut self, chunk: (i32, i32), loaded: bool) {
        if loaded {
            self.unloaded_chunks.remove(&chunk);
        } else {
            self.unloaded_chunks.insert(chunk);
        }
    }

    pub fn allocate_agent_id(&mut self) -> u64 {
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        id
    }

    pub fn spawn_body(&mut self, id: u64, pos: GridPos) {
        self.bodies.insert(
            id,
            Body {
                pos,
                flags: BTreeSet::new(),
                walk: None,
                arrived: None,
            },
        );
    }

    pub fn body_flag(&self, id: u64, flag: BodyFlag) -> bool {
        self.bodies
            .get(&id)
            .is_some_and(|b| b.flags.contains(&flag))
    }

    pub fn has_body(&self, id: u64) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Advance every walking body by one tick of progress.
    pub fn step_movement(&mut self) {
        for body in self.bodies.values_mut() {
            let Some(walk) = body.walk.as_mut() else {
                continue;
            };

            walk.progress += walk.speed;
            while walk.progress >= 1.0 && walk.next < walk.cells.len() {
                body.pos = walk.cells[walk.next];
                walk.next += 1;
                walk.progress -= 1.0;
            }

            if walk.next >= walk.cells.len() {
                body.walk = None;
                body.arrived = Some(true);
            }
        }
    }
}

impl WorldView for MapWorld {
    type Agent = u64;
}

impl WorldMut for MapWorld {}

impl CellView for MapWorld {
    fn cell(&self, pos: GridPos) -> Result<Option<CellSnapshot>, CellError> {
        if self.unloaded_chunks.contains(&chunk_of(pos)) {
            return Err(CellError::Unloaded(pos));
        }
        if pos.x.abs() > self.bound || pos.z.abs() > self.bound || pos.y < -1 || pos.y > self.max_y
        {
            return Ok(None);
        }

        let type_id = match self.cells.get(&pos) {
            Some(type_id) => type_id.clone(),
            None if pos.y == -1 => self.floor.clone(),
            None => self.air.clone(),
        };
        let tags = self.tags.get(&type_id).cloned().unwrap_or_default();
        Ok(Some(CellSnapshot::new(type_id).with_tags(tags)))
    }
}

impl HarvestWorld for MapWorld {
    fn body_location(&self, agent: u64) -> Option<GridPos> {
        self.bodies.get(&agent).map(|b| b.pos)
    }

    fn body_is_valid(&self, agent: u64) -> bool {
        self.bodies.contains_key(&agent)
    }

    fn set_body_flag(&mut self, agent: u64, flag: BodyFlag, value: bool) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            if value {
                body.flags.insert(flag);
            } else {
                body.flags.remove(&flag);
            }
        }
    }

    fn kill_body(&mut self, agent: u64) {
        self.bodies.remove(&agent);
    }

    fn property(&self, agent: u64, key: &str) -> Option<PropValue> {
        self.props.get(&(agent, key.to_string())).cloned()
    }

    fn set_property(&mut self, agent: u64, key: &str, value: PropValue) {
        self.props.insert((agent, key.to_string()), value);
    }

    fn begin_move(&mut self, agent: u64, path: PlannedPath, speed: f32) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.arrived = None;
            body.walk = Some(Walk {
                cells: path.cells,
                next: 1,
                speed: speed.max(0.0),
                progress: 0.0,
            });
        }
    }

    fn poll_move(&mut self, agent: u64) -> Option<bool> {
        self.bodies.get_mut(&agent).and_then(|b| b.arrived.take())
    }

    fn set_cell(&mut self, pos: GridPos, type_id: CellTypeId) {
        self.cells.insert(pos, type_id);
    }

    fn deposit(&mut self, container: GridPos, resource: &CellTypeId, amount: u64) -> u64 {
        let Some(slot) = self.containers.get_mut(&container) else {
            return 0;
        };
        let held: u64 = slot.slots.values().sum();
        let accepted = amount.min(slot.capacity.saturating_sub(held));
        if accepted > 0 {
            *slot.slots.entry(resource.clone()).or_insert(0) += accepted;
        }
        accepted
    }
}
