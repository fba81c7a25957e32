//! Spawn placement for newly anchored agents.

use grove_core::rng::derive_seed;
use grove_core::{DeterministicRng, SplitMix64};
use grove_grid::{CellTypeId, CellView, GridPos};
use tracing::warn;

/// Pick a cleared cell in the 3x3x3 cuboid around a freshly placed anchor.
///
/// The pick is seeded from the world seed and the anchor position, so a
/// replayed world spawns agents in the same spots.
pub fn find_spawn_spot<W: CellView>(
    world: &W,
    anchor: GridPos,
    cleared: &CellTypeId,
    seed: u64,
) -> Option<GridPos> {
    let mut empties = Vec::new();
    for dy in -1..=1 {
        for dz in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let pos = anchor.offset(dx, dy, dz);
                if let Ok(Some(cell)) = world.cell(pos) {
                    if cell.type_id == *cleared {
                        empties.push(pos);
                    }
                }
            }
        }
    }

    if empties.is_empty() {
        warn!(anchor = %anchor, "no empty space around anchor, cannot spawn");
        return None;
    }

    let mut rng = SplitMix64::new(derive_seed(seed, pos_key(anchor), 0));
    Some(empties[rng.pick_index(empties.len())])
}

fn pos_key(pos: GridPos) -> u64 {
    (pos.x as u64 & 0x1F_FFFF) | ((pos.y as u64 & 0x3FF) << 21) | ((pos.z as u64 & 0x1F_FFFF) << 31)
}
