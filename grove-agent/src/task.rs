use grove_core::{Job, JobProgress, JobScheduler};
use grove_grid::{CellView, GridPos, PathPlanner, PathSpec, PlannedPath, RegionSearch, RegionSearchSpec};

/// Result of any agent-owned cooperative job.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    Search(Option<GridPos>),
    Path(Option<PlannedPath>),
}

/// One scheduler per registry; all agents' jobs share its resume budget.
pub type AgentJobs<W> = JobScheduler<W, TaskOutput>;

/// Adapts [`RegionSearch`] to the registry's job scheduler.
pub struct SearchTask {
    inner: RegionSearch,
}

impl SearchTask {
    pub fn new(spec: RegionSearchSpec) -> Self {
        Self {
            inner: RegionSearch::new(spec),
        }
    }
}

impl<W: CellView + ?Sized> Job<W> for SearchTask {
    type Output = TaskOutput;

    fn resume(&mut self, world: &W) -> JobProgress<Self::Output> {
        match self.inner.resume(world) {
            JobProgress::Pending => JobProgress::Pending,
            JobProgress::Done(result) => JobProgress::Done(TaskOutput::Search(result)),
        }
    }
}

/// Adapts [`PathPlanner`] to the registry's job scheduler.
pub struct PlanTask {
    inner: PathPlanner,
}

impl PlanTask {
    pub fn new(spec: PathSpec) -> Self {
        Self {
            inner: PathPlanner::new(spec),
        }
    }
}

impl<W: CellView + ?Sized> Job<W> for PlanTask {
    type Output = TaskOutput;

    fn resume(&mut self, world: &W) -> JobProgress<Self::Output> {
        match self.inner.resume(world) {
            JobProgress::Pending => JobProgress::Pending,
            JobProgress::Done(result) => JobProgress::Done(TaskOutput::Path(result)),
        }
    }
}
