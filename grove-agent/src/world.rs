use grove_core::WorldMut;
use grove_grid::{CellTypeId, CellView, GridPos, PlannedPath};

/// Animation/diagnostic flags mirrored onto the external body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyFlag {
    Moving,
    Acting,
}

/// Typed value in the per-entity key/value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

/// Everything the agent kernel needs from the host world.
///
/// The host owns block/entity storage, movement, and inventories; the kernel
/// only drives them through this seam. Movement completion is asynchronous:
/// `begin_move` hands a path to the driver and `poll_move` reports `None`
/// until the body either arrives (`Some(true)`) or definitively fails
/// (`Some(false)`).
pub trait HarvestWorld: WorldMut + CellView {
    fn body_location(&self, agent: Self::Agent) -> Option<GridPos>;

    fn body_is_valid(&self, agent: Self::Agent) -> bool;

    fn set_body_flag(&mut self, agent: Self::Agent, flag: BodyFlag, value: bool);

    fn kill_body(&mut self, agent: Self::Agent);

    /// Persisted per-entity key/value store; survives reloads.
    fn property(&self, agent: Self::Agent, key: &str) -> Option<PropValue>;

    fn set_property(&mut self, agent: Self::Agent, key: &str, value: PropValue);

    fn begin_move(&mut self, agent: Self::Agent, path: PlannedPath, speed: f32);

    fn poll_move(&mut self, agent: Self::Agent) -> Option<bool>;

    /// Commit a cell-type change (felling, reseeding).
    fn set_cell(&mut self, pos: GridPos, type_id: CellTypeId);

    /// Add resources to a container; returns the amount actually accepted.
    fn deposit(&mut self, container: GridPos, resource: &CellTypeId, amount: u64) -> u64;
}
