//! Grid-cell spatial primitives and bounded cooperative searches.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod astar;
pub mod cell;
pub mod flood;
pub mod pos;
pub mod world;

pub use astar::{PathPlanner, PathSpec, PlannedPath};
pub use cell::{CellFilter, CellKind, CellSnapshot, CellTypeId};
pub use flood::{connected_component, RegionSearch, RegionSearchSpec};
pub use pos::GridPos;
pub use world::{CellError, CellView};
