use core::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use grove_core::{Job, JobProgress};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{CellFilter, CellKind, CellView, GridPos};

/// Parameters of one budgeted path query. Immutable once planning starts.
#[derive(Debug, Clone)]
pub struct PathSpec {
    pub start: GridPos,
    pub goal: GridPos,
    pub filter: CellFilter,
    /// Planning fails once this many nodes have been expanded.
    pub max_expansions: u32,
    /// Arrival within this Chebyshev distance of the goal counts as reaching
    /// it; targets themselves are usually not passable.
    pub arrive_radius: u32,
}

impl PathSpec {
    pub fn new(start: GridPos, goal: GridPos, filter: CellFilter) -> Self {
        Self {
            start,
            goal,
            filter,
            max_expansions: 300,
            arrive_radius: 1,
        }
    }
}

/// Cell-by-cell walkable route, start included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannedPath {
    pub cells: Vec<GridPos>,
}

impl PlannedPath {
    pub fn end(&self) -> Option<GridPos> {
        self.cells.last().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug)]
struct OpenNode {
    f: u32,
    g: u32,
    pos: GridPos,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, GridPos, u64) {
        (self.f, self.g, self.pos, self.tie)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

/// Budgeted A* over the passable-cell graph.
///
/// Unit-cost moves: lateral step, climb onto a blocking (but not unjumpable)
/// neighbor with a passable cell above, drop below a passable neighbor. The
/// Chebyshev heuristic is admissible for this move set. Runs as a [`Job`],
/// expanding one node per resume.
pub struct PathPlanner {
    spec: PathSpec,
    open: BinaryHeap<OpenNode>,
    g_score: BTreeMap<GridPos, u32>,
    came_from: BTreeMap<GridPos, GridPos>,
    expanded: u32,
    tie: u64,
    seeded: bool,
}

impl PathPlanner {
    pub fn new(spec: PathSpec) -> Self {
        Self {
            spec,
            open: BinaryHeap::new(),
            g_score: BTreeMap::new(),
            came_from: BTreeMap::new(),
            expanded: 0,
            tie: 0,
            seeded: false,
        }
    }

    /// Nodes expanded so far; never exceeds `max_expansions`.
    pub fn expanded(&self) -> u32 {
        self.expanded
    }

    fn heuristic(&self, pos: GridPos) -> u32 {
        pos.chebyshev(self.spec.goal)
    }

    fn push_open(&mut self, pos: GridPos, g: u32) {
        let f = g.saturating_add(self.heuristic(pos));
        self.open.push(OpenNode {
            f,
            g,
            pos,
            tie: self.tie,
        });
        self.tie += 1;
    }

    fn reconstruct(&self, end: GridPos) -> PlannedPath {
        let mut cells = vec![end];
        let mut current = end;
        while let Some(&prev) = self.came_from.get(&current) {
            current = prev;
            cells.push(current);
        }
        cells.reverse();
        PlannedPath { cells }
    }

    /// Walkable one-step moves from `from`, in deterministic order.
    fn steps_from<W: CellView + ?Sized>(&self, world: &W, from: GridPos, out: &mut Vec<GridPos>) {
        out.clear();
        for n in from.lateral_neighbors() {
            let Ok(Some(cell)) = world.cell(n) else {
                continue;
            };
            match self.spec.filter.classify(&cell) {
                CellKind::Passable => {
                    out.push(n);
                    if let Ok(Some(below)) = world.cell(n.below()) {
                        if self.spec.filter.classify(&below) == CellKind::Passable {
                            out.push(n.below());
                        }
                    }
                }
                CellKind::Blocking => {
                    if !self.spec.filter.is_unjumpable(&cell) {
                        if let Ok(Some(above)) = world.cell(n.above()) {
                            if self.spec.filter.classify(&above) == CellKind::Passable {
                                out.push(n.above());
                            }
                        }
                    }
                }
                CellKind::Target => {}
            }
        }
    }
}

impl<W: CellView + ?Sized> Job<W> for PathPlanner {
    type Output = Option<PlannedPath>;

    fn resume(&mut self, world: &W) -> JobProgress<Self::Output> {
        if !self.seeded {
            self.seeded = true;
            if self.spec.start.chebyshev(self.spec.goal) <= self.spec.arrive_radius {
                return JobProgress::Done(Some(PlannedPath {
                    cells: vec![self.spec.start],
                }));
            }
            self.g_score.insert(self.spec.start, 0);
            self.push_open(self.spec.start, 0);
            return JobProgress::Pending;
        }

        let mut steps = Vec::new();
        while let Some(node) = self.open.pop() {
            if self.g_score.get(&node.pos) != Some(&node.g) {
                // Stale heap entry.
                continue;
            }

            if node.pos.chebyshev(self.spec.goal) <= self.spec.arrive_radius {
                return JobProgress::Done(Some(self.reconstruct(node.pos)));
            }

            if self.expanded >= self.spec.max_expansions {
                return JobProgress::Done(None);
            }
            self.expanded += 1;

            self.steps_from(world, node.pos, &mut steps);
            for &n in &steps {
                let tentative = node.g.saturating_add(1);
                if tentative >= self.g_score.get(&n).copied().unwrap_or(u32::MAX) {
                    continue;
                }
                self.came_from.insert(n, node.pos);
                self.g_score.insert(n, tentative);
                self.push_open(n, tentative);
            }

            // One expansion per resume.
            return JobProgress::Pending;
        }

        JobProgress::Done(None)
    }
}
