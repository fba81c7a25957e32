use std::collections::{BTreeSet, VecDeque};

use grove_core::{Job, JobProgress};

use crate::{CellError, CellFilter, CellKind, CellTypeId, CellView, GridPos};

/// Parameters of one bounded region search. Immutable once the search starts.
#[derive(Debug, Clone)]
pub struct RegionSearchSpec {
    pub center: GridPos,
    /// Step budget through the passable graph, not straight-line distance.
    pub radius: u32,
    pub filter: CellFilter,
    /// Locations excluded from results (previously rejected candidates).
    pub ignored: BTreeSet<GridPos>,
}

impl RegionSearchSpec {
    pub fn new(center: GridPos, radius: u32, filter: CellFilter) -> Self {
        Self {
            center,
            radius,
            filter,
            ignored: BTreeSet::new(),
        }
    }
}

/// Breadth-first flood fill that locates the first qualifying target cell
/// reachable from the center through passable cells.
///
/// Runs as a [`Job`]: every `resume` evaluates at most one frontier cell, so
/// the search cannot monopolize a simulation step regardless of radius.
/// First-found wins; there is no cost comparison between candidates.
pub struct RegionSearch {
    spec: RegionSearchSpec,
    frontier: VecDeque<(GridPos, u32)>,
    seen: BTreeSet<GridPos>,
    seeded: bool,
}

impl RegionSearch {
    pub fn new(spec: RegionSearchSpec) -> Self {
        Self {
            spec,
            frontier: VecDeque::new(),
            seen: BTreeSet::new(),
            seeded: false,
        }
    }

    fn push(&mut self, pos: GridPos, depth: u32) {
        if self.seen.insert(pos) {
            self.frontier.push_back((pos, depth));
        }
    }

    /// Enqueue every cell reachable in one step from `from`.
    ///
    /// Neighbors are enqueued regardless of classification — classification
    /// happens when a cell is popped, which is how non-passable target cells
    /// at the rim of the fill get discovered. Climbing is allowed over
    /// blocking neighbors that are not unjumpable and have a passable cell
    /// above; dropping is allowed below passable neighbors.
    fn expand_from<W: CellView + ?Sized>(&mut self, world: &W, from: GridPos, depth: u32) {
        for n in from.lateral_neighbors() {
            self.push(n, depth + 1);

            let Ok(Some(cell)) = world.cell(n) else {
                continue;
            };
            match self.spec.filter.classify(&cell) {
                CellKind::Passable => {
                    if passable_at(world, &self.spec.filter, n.below()) {
                        self.push(n.below(), depth + 1);
                    }
                }
                CellKind::Blocking => {
                    if !self.spec.filter.is_unjumpable(&cell)
                        && passable_at(world, &self.spec.filter, n.above())
                    {
                        self.push(n.above(), depth + 1);
                    }
                }
                CellKind::Target => {}
            }
        }
    }
}

impl<W: CellView + ?Sized> Job<W> for RegionSearch {
    type Output = Option<GridPos>;

    fn resume(&mut self, world: &W) -> JobProgress<Self::Output> {
        if !self.seeded {
            // The center is the anchor cell itself and is expanded without
            // classification; the fill proper starts at its neighbors.
            self.seeded = true;
            self.seen.insert(self.spec.center);
            self.expand_from(world, self.spec.center, 0);
            return JobProgress::Pending;
        }

        let Some((pos, depth)) = self.frontier.pop_front() else {
            return JobProgress::Done(None);
        };

        // Unloaded or out-of-world cells dead-end the fill at this position.
        let Ok(Some(cell)) = world.cell(pos) else {
            return JobProgress::Pending;
        };

        match self.spec.filter.classify(&cell) {
            CellKind::Target => {
                if !self.spec.ignored.contains(&pos) {
                    return JobProgress::Done(Some(pos));
                }
                // Excluded candidate; the fill does not pass through it.
            }
            CellKind::Passable => {
                if depth < self.spec.radius {
                    self.expand_from(world, pos, depth);
                }
            }
            CellKind::Blocking => {}
        }

        JobProgress::Pending
    }
}

fn passable_at<W: CellView + ?Sized>(world: &W, filter: &CellFilter, pos: GridPos) -> bool {
    matches!(
        world.cell(pos),
        Ok(Some(ref cell)) if filter.classify(cell) == CellKind::Passable
    )
}

/// Gather the connected component of `types`-typed cells containing `start`,
/// capped at `cap` cells. Face-adjacency, deterministic visit order.
///
/// Synchronous but bounded by `cap`; used for post-discovery validation
/// ("is this an actual structure?") and for harvesting a found structure.
/// Propagates [`CellError::Unloaded`] so callers can back off and retry.
pub fn connected_component<W: CellView + ?Sized>(
    world: &W,
    start: GridPos,
    types: &BTreeSet<CellTypeId>,
    cap: usize,
) -> Result<Vec<GridPos>, CellError> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();

    seen.insert(start);
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        let Some(cell) = world.cell(pos)? else {
            continue;
        };
        if !types.contains(&cell.type_id) {
            continue;
        }

        out.push(pos);
        if out.len() >= cap {
            break;
        }

        for n in pos.neighbors6() {
            if seen.insert(n) {
                queue.push_back(n);
            }
        }
    }

    Ok(out)
}
