//! Host events routed into the engine.

use grove_agent::SettingsUpdate;
use grove_grid::GridPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// A manager post was placed: spawn a harvester beside it and register it.
    ManagerPlaced { pos: GridPos },
    /// A manager post was broken: unregister and remove the anchored agent.
    ManagerBroken { pos: GridPos },
    /// An agent body was loaded from persisted storage (world reload).
    BodyLoaded { id: u64 },
    /// A player interacted with the post at `pos`. Goes through the debounce
    /// gate; an accepted interaction applies the settings update.
    Interact {
        player: u64,
        pos: GridPos,
        at_ms: u64,
        update: SettingsUpdate,
    },
}
