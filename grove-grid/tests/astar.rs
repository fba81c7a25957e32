use std::collections::BTreeMap;

use grove_core::{Job, JobProgress, WorldView};
use grove_grid::{CellError, CellFilter, CellSnapshot, CellView, GridPos, PathPlanner, PathSpec};

/// Flat voxel plane: air from y = 0 up to y = 8 within `bound`, void outside.
struct VoxelWorld {
    cells: BTreeMap<GridPos, &'static str>,
    bound: i32,
}

impl VoxelWorld {
    fn flat(bound: i32) -> Self {
        Self {
            cells: BTreeMap::new(),
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
        if pos.x.abs() > self.bound || pos.z.abs() > self.bound || pos.y < 0 || pos.y > 8 {
            return Ok(None);
        }
        let type_id = self.cells.get(&pos).copied().unwrap_or("grove:air");
        Ok(Some(CellSnapshot::new(type_id)))
    }
}

fn filter() -> CellFilter {
    let mut f = CellFilter::default();
    f.target_types.insert("grove:trunk".into());
    f.passable_types.insert("grove:air".into());
    f.unjumpable_types.insert("grove:fence".into());
    f
}

fn run_planner(world: &VoxelWorld, spec: PathSpec) -> (Option<grove_grid::PlannedPath>, u32) {
    let mut planner = PathPlanner::new(spec);
    for _ in 0..100_000 {
        if let JobProgress::Done(result) = planner.resume(world) {
            return (result, planner.expanded());
        }
    }
    panic!("planner did not terminate");
}

#[test]
fn path_ends_adjacent_to_a_blocking_goal() {
    let mut world = VoxelWorld::flat(16);
    let goal = GridPos::new(6, 0, 0);
    world.set(goal, "grove:trunk");

    let spec = PathSpec::new(GridPos::new(0, 0, 0), goal, filter());
    let (path, _) = run_planner(&world, spec);
    let path = path.expect("path should exist");

    assert_eq!(path.cells.first().copied(), Some(GridPos::new(0, 0, 0)));
    let end = path.end().expect("non-empty path");
    assert!(end.chebyshev(goal) <= 1);
    for pair in path.cells.windows(2) {
        assert!(pair[0].chebyshev(pair[1]) <= 1, "path step too large");
    }
}

#[test]
fn budget_exhaustion_reports_failure_not_a_truncated_path() {
    let mut world = VoxelWorld::flat(60);
    let goal = GridPos::new(40, 0, 0);
    world.set(goal, "grove:trunk");

    let mut spec = PathSpec::new(GridPos::new(0, 0, 0), goal, filter());
    spec.max_expansions = 10;

    let (path, expanded) = run_planner(&world, spec);
    assert_eq!(path, None);
    assert!(expanded <= 10, "expanded {expanded} nodes past the budget");
}

#[test]
fn unjumpable_wall_makes_the_goal_unreachable() {
    let mut world = VoxelWorld::flat(8);
    for z in -8..=8 {
        world.set(GridPos::new(2, 0, z), "grove:fence");
    }
    let goal = GridPos::new(5, 0, 0);
    world.set(goal, "grove:trunk");

    let spec = PathSpec::new(GridPos::new(0, 0, 0), goal, filter());
    let (path, _) = run_planner(&world, spec);
    assert_eq!(path, None);
}

#[test]
fn low_wall_is_climbed() {
    let mut world = VoxelWorld::flat(8);
    for z in -8..=8 {
        world.set(GridPos::new(2, 0, z), "grove:crate");
    }
    let goal = GridPos::new(5, 0, 0);
    world.set(goal, "grove:trunk");

    let spec = PathSpec::new(GridPos::new(0, 0, 0), goal, filter());
    let (path, _) = run_planner(&world, spec);
    let path = path.expect("path should climb the wall");
    assert!(path.cells.iter().any(|c| c.y == 1), "no climb step in path");
}

#[test]
fn start_within_arrive_radius_is_a_trivial_path() {
    let mut world = VoxelWorld::flat(8);
    let goal = GridPos::new(1, 0, 0);
    world.set(goal, "grove:trunk");

    let spec = PathSpec::new(GridPos::new(0, 0, 0), goal, filter());
    let (path, expanded) = run_planner(&world, spec);
    assert_eq!(
        path.map(|p| p.cells),
        Some(vec![GridPos::new(0, 0, 0)])
    );
    assert_eq!(expanded, 0);
}

#[test]
fn planning_is_deterministic_for_same_input() {
    let mut world = VoxelWorld::flat(16);
    for z in -3..=3 {
        world.set(GridPos::new(4, 0, z), "grove:fence");
    }
    let goal = GridPos::new(8, 0, 0);
    world.set(goal, "grove:trunk");

    let spec = PathSpec::new(GridPos::new(0, 0, 0), goal, filter());
    let (a, _) = run_planner(&world, spec.clone());
    let (b, _) = run_planner(&world, spec);
    assert_eq!(a, b);
    assert!(a.is_some());
}
