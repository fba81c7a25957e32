use std::collections::{BTreeMap, BTreeSet};

use grove_core::{Job, JobProgress, WorldView};
use grove_grid::{
    connected_component, CellError, CellFilter, CellSnapshot, CellView, GridPos, RegionSearch,
    RegionSearchSpec,
};

/// Flat voxel plane: air from y = 0 up to y = 8 within `bound`, void outside,
/// with specific cells overridden.
struct VoxelWorld {
    cells: BTreeMap<GridPos, &'static str>,
    unloaded: BTreeSet<GridPos>,
    bound: i32,
}

impl VoxelWorld {
    fn flat(bound: i32) -> Self {
        Self {
            cells: BTreeMap::new(),
            unloaded: BTreeSet::new(),
            bound,
        }
    }

    fn set(&mut self, pos: GridPos, type_id: &'static str) {
        self.cells.insert(pos, type_id);
    }
}

impl WorldView for VoxelWorld {
    type Agent = u64;
}

impl CellView for VoxelWorld {
    fn cell(&self, pos: GridPos) -> Result<Option<CellSnapshot>, CellError> {
        if self.unloaded.contains(&pos) {
            return Err(CellError::Unloaded(pos));
        }
        if pos.x.abs() > self.bound || pos.z.abs() > self.bound || pos.y < 0 || pos.y > 8 {
            return Ok(None);
        }

        let type_id = self.cells.get(&pos).copied().unwrap_or("grove:air");
        let snapshot = if type_id == "grove:flower_patch" {
            CellSnapshot::new(type_id).with_tags(vec!["bloom".to_string()])
        } else {
            CellSnapshot::new(type_id)
        };
        Ok(Some(snapshot))
    }
}

fn filter() -> CellFilter {
    let mut f = CellFilter::default();
    f.target_types.insert("grove:trunk".into());
    f.target_tags.insert("bloom".to_string());
    f.passable_types.insert("grove:air".into());
    f.passable_types.insert("grove:canopy".into());
    f.unjumpable_types.insert("grove:fence".into());
    f
}

fn run_search(world: &VoxelWorld, spec: RegionSearchSpec) -> Option<GridPos> {
    let mut search = RegionSearch::new(spec);
    for _ in 0..100_000 {
        if let JobProgress::Done(result) = search.resume(world) {
            return result;
        }
    }
    panic!("search did not terminate");
}

#[test]
fn finds_reachable_target_through_passable_cells() {
    let mut world = VoxelWorld::flat(16);
    world.set(GridPos::new(3, 0, 4), "grove:trunk");

    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 10, filter());
    assert_eq!(run_search(&world, spec), Some(GridPos::new(3, 0, 4)));
}

#[test]
fn ignored_target_is_never_returned() {
    let mut world = VoxelWorld::flat(16);
    world.set(GridPos::new(3, 0, 4), "grove:trunk");

    let mut spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 10, filter());
    spec.ignored.insert(GridPos::new(3, 0, 4));
    assert_eq!(run_search(&world, spec), None);
}

#[test]
fn radius_is_a_step_budget() {
    let mut world = VoxelWorld::flat(16);
    world.set(GridPos::new(10, 0, 0), "grove:trunk");
    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 10, filter());
    assert_eq!(run_search(&world, spec), Some(GridPos::new(10, 0, 0)));

    let mut world = VoxelWorld::flat(16);
    world.set(GridPos::new(11, 0, 0), "grove:trunk");
    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 10, filter());
    assert_eq!(run_search(&world, spec), None);
}

#[test]
fn unjumpable_wall_blocks_the_fill() {
    let mut world = VoxelWorld::flat(8);
    for z in -8..=8 {
        world.set(GridPos::new(2, 0, z), "grove:fence");
    }
    world.set(GridPos::new(4, 0, 0), "grove:trunk");

    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 12, filter());
    assert_eq!(run_search(&world, spec), None);
}

#[test]
fn low_wall_can_be_climbed() {
    let mut world = VoxelWorld::flat(8);
    for z in -8..=8 {
        world.set(GridPos::new(2, 0, z), "grove:crate");
    }
    world.set(GridPos::new(4, 0, 0), "grove:trunk");

    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 12, filter());
    assert_eq!(run_search(&world, spec), Some(GridPos::new(4, 0, 0)));
}

#[test]
fn tagged_cells_qualify_as_targets() {
    let mut world = VoxelWorld::flat(16);
    world.set(GridPos::new(2, 0, -1), "grove:flower_patch");

    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 6, filter());
    assert_eq!(run_search(&world, spec), Some(GridPos::new(2, 0, -1)));
}

#[test]
fn empty_region_completes_with_no_result() {
    let world = VoxelWorld::flat(8);
    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 6, filter());
    assert_eq!(run_search(&world, spec), None);
}

#[test]
fn one_frontier_cell_per_resume() {
    let world = VoxelWorld::flat(16);
    let spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 10, filter());
    let mut search = RegionSearch::new(spec);

    // A radius-10 plane holds hundreds of cells; fifty resumes cannot finish.
    for _ in 0..50 {
        assert!(matches!(search.resume(&world), JobProgress::Pending));
    }
}

#[test]
fn connected_component_gathers_structure_cells() {
    let mut world = VoxelWorld::flat(16);
    let base = GridPos::new(5, 0, 5);
    for dy in 0..3 {
        world.set(base.offset(0, dy, 0), "grove:trunk");
    }
    world.set(base.offset(0, 3, 0), "grove:canopy");
    world.set(base.offset(1, 2, 0), "grove:canopy");

    let mut types = BTreeSet::new();
    types.insert("grove:trunk".into());
    types.insert("grove:canopy".into());

    let component = connected_component(&world, base, &types, 100).expect("loaded");
    assert_eq!(component.len(), 5);

    let capped = connected_component(&world, base, &types, 2).expect("loaded");
    assert_eq!(capped.len(), 2);
}

#[test]
fn connected_component_propagates_unloaded_regions() {
    let mut world = VoxelWorld::flat(16);
    let base = GridPos::new(5, 0, 5);
    world.set(base, "grove:trunk");
    world.set(base.above(), "grove:trunk");
    world.unloaded.insert(base.above());

    let mut types = BTreeSet::new();
    types.insert("grove:trunk".into());

    let result = connected_component(&world, base, &types, 100);
    assert_eq!(result, Err(CellError::Unloaded(base.above())));
}
