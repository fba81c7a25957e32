use grove_core::WorldView;
use thiserror::Error;

use crate::{CellSnapshot, GridPos};

/// Spatial-query failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    /// The containing region is not currently resident. Transient; callers
    /// should treat this as "try later", never as a missing cell.
    #[error("region containing {0} is not loaded")]
    Unloaded(GridPos),
}

/// Read access to grid cells.
///
/// `Ok(None)` means the position lies outside the world volume and will never
/// hold a cell; `Err(CellError::Unloaded)` is transient.
pub trait CellView: WorldView {
    fn cell(&self, pos: GridPos) -> Result<Option<CellSnapshot>, CellError>;
}
