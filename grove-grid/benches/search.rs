use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grove_core::{Job, JobProgress, WorldView};
use grove_grid::{
    CellError, CellFilter, CellSnapshot, CellView, GridPos, PathPlanner, PathSpec, RegionSearch,
    RegionSearchSpec,
};

struct VoxelWorld {
    cells: BTreeMap<GridPos, &'static str>,
    bound: i32,
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

fn scattered_world(bound: i32) -> VoxelWorld {
    let mut cells = BTreeMap::new();
    // Pillars every 7 cells make the plane non-trivial to traverse.
    for x in (-bound..=bound).step_by(7) {
        for z in (-bound..=bound).step_by(7) {
            cells.insert(GridPos::new(x, 0, z), "grove:rock");
        }
    }
    cells.insert(GridPos::new(bound - 2, 0, bound - 2), "grove:trunk");
    VoxelWorld { cells, bound }
}

fn filter() -> CellFilter {
    let mut f = CellFilter::default();
    f.target_types.insert("grove:trunk".into());
    f.passable_types.insert("grove:air".into());
    f.unjumpable_types.insert("grove:fence".into());
    f
}

fn bench_search(c: &mut Criterion) {
    let world = scattered_world(24);
    let mut group = c.benchmark_group("grove-grid/search");

    let search_spec = RegionSearchSpec::new(GridPos::new(0, 0, 0), 48, filter());
    group.bench_function("region_search_to_completion", |b| {
        b.iter(|| {
            let mut search = RegionSearch::new(search_spec.clone());
            loop {
                if let JobProgress::Done(result) = search.resume(&world) {
                    black_box(result);
                    break;
                }
            }
        })
    });

    let mut path_spec = PathSpec::new(
        GridPos::new(-22, 0, -22),
        GridPos::new(22, 0, 22),
        filter(),
    );
    path_spec.max_expansions = 20_000;
    group.bench_function("path_planner_to_completion", |b| {
        b.iter(|| {
            let mut planner = PathPlanner::new(path_spec.clone());
            loop {
                if let JobProgress::Done(result) = planner.resume(&world) {
                    black_box(result.map(|p| p.cells.len()));
                    break;
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
