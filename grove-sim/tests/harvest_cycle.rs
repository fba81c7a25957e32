use std::io::Write;

use grove_agent::{HarvestWorld, SettingsUpdate};
use grove_grid::{CellTypeId, GridPos};
use grove_sim::{MapWorld, SimConfig, SimEvent, Simulation};

fn plant_tree(world: &mut MapWorld, base: GridPos) {
    for dy in 0..3 {
        world.put(base.offset(0, dy, 0), "grove:trunk");
    }
    world.put(base.offset(1, 2, 0), "grove:canopy");
    world.put(base.offset(-1, 2, 0), "grove:canopy");
    world.put(base.offset(0, 2, 1), "grove:canopy");
    world.put(base.offset(0, 2, -1), "grove:canopy");
    world.put(base.offset(0, 3, 0), "grove:canopy");
}

/// A post at the origin with a bin beside it and one tree in range.
fn demo_sim() -> Simulation {
    let mut world = MapWorld::new(24);
    world.put(GridPos::new(1, 0, 1), "grove:bin");
    world.place_container(GridPos::new(1, 0, 1), 1_000);
    plant_tree(&mut world, GridPos::new(5, 0, 0));

    let mut sim = Simulation::new(SimConfig::default(), world);
    sim.handle(SimEvent::ManagerPlaced {
        pos: GridPos::new(0, 0, 0),
    });
    sim
}

fn sole_agent_id(sim: &Simulation) -> u64 {
    sim.registry.agents().next().expect("one agent").id()
}

#[test]
fn placing_a_manager_spawns_and_registers_an_agent() {
    let sim = demo_sim();

    assert_eq!(sim.registry.len(), 1);
    let agent = sim.registry.agents().next().expect("agent");
    assert_eq!(agent.anchor(), GridPos::new(0, 0, 0));
    assert!(sim.world.has_body(agent.id()));

    // Spawned in the cuboid around the post.
    let spot = sim
        .world
        .body_location(agent.id())
        .expect("body placed");
    assert!(spot.chebyshev(GridPos::new(0, 0, 0)) <= 1);
}

#[test]
fn full_cycle_fills_the_container_and_reseeds() {
    let mut sim = demo_sim();
    sim.run(2_000);

    assert_eq!(
        sim.world.delivered_totals().get("grove:bare_trunk"),
        Some(&3)
    );
    assert_eq!(
        sim.world.type_at(GridPos::new(5, 0, 0)),
        Some(&CellTypeId::new("grove:sprout"))
    );

    let summary = sim.summary();
    assert_eq!(summary.agents, 1);
    assert_eq!(summary.delivered.get("grove:bare_trunk"), Some(&3));
    assert!(summary.carried.is_empty());

    // Same number through the per-container view, and no flag left stuck on.
    let bare_trunk = CellTypeId::new("grove:bare_trunk");
    assert_eq!(
        sim.world.container_stock(GridPos::new(1, 0, 1), &bare_trunk),
        3
    );
    let id = sole_agent_id(&sim);
    assert!(!sim.world.body_flag(id, grove_agent::BodyFlag::Moving));
    assert!(!sim.world.body_flag(id, grove_agent::BodyFlag::Acting));
}

#[test]
fn tag_qualified_targets_still_fail_canopy_validation() {
    let mut world = MapWorld::new(24);
    world.put(GridPos::new(1, 0, 1), "grove:bin");
    world.place_container(GridPos::new(1, 0, 1), 1_000);
    world.register_tags("grove:bloom", vec!["flower".to_string()]);
    world.put(GridPos::new(3, 0, 2), "grove:bloom");

    let mut config = SimConfig::default();
    config.profile.target_tags = vec!["flower".to_string()];

    let mut sim = Simulation::new(config, world);
    sim.handle(SimEvent::ManagerPlaced {
        pos: GridPos::new(0, 0, 0),
    });
    sim.run(600);

    // The bloom qualifies by tag but has no connected canopy, so it is
    // rejected onto the ignore list rather than harvested.
    assert!(sim.world.delivered_totals().is_empty());
    let agent = sim.registry.agents().next().expect("agent");
    assert!(agent.ignored().contains(&GridPos::new(3, 0, 2)));
}

#[test]
fn breaking_the_manager_removes_the_agent() {
    let mut sim = demo_sim();
    let id = sole_agent_id(&sim);

    sim.handle(SimEvent::ManagerBroken {
        pos: GridPos::new(0, 0, 0),
    });

    assert!(sim.registry.is_empty());
    assert!(!sim.world.has_body(id));

    // A second notification for the same post is a no-op.
    sim.handle(SimEvent::ManagerBroken {
        pos: GridPos::new(0, 0, 0),
    });
    assert!(sim.registry.is_empty());
}

#[test]
fn interactions_are_debounced_per_player() {
    let mut sim = demo_sim();
    let id = sole_agent_id(&sim);
    let post = GridPos::new(0, 0, 0);

    sim.handle(SimEvent::Interact {
        player: 1,
        pos: post,
        at_ms: 1_000,
        update: SettingsUpdate {
            enabled: Some(false),
            ..SettingsUpdate::default()
        },
    });
    assert!(!sim.registry.get(id).expect("agent").enabled());

    // Inside the window: the re-enable is swallowed.
    sim.handle(SimEvent::Interact {
        player: 1,
        pos: post,
        at_ms: 1_200,
        update: SettingsUpdate {
            enabled: Some(true),
            ..SettingsUpdate::default()
        },
    });
    assert!(!sim.registry.get(id).expect("agent").enabled());

    // Past the window it lands.
    sim.handle(SimEvent::Interact {
        player: 1,
        pos: post,
        at_ms: 1_500,
        update: SettingsUpdate {
            enabled: Some(true),
            ..SettingsUpdate::default()
        },
    });
    assert!(sim.registry.get(id).expect("agent").enabled());
}

#[test]
fn reload_reconstructs_the_agent_from_properties() {
    let mut sim = demo_sim();
    let id = sole_agent_id(&sim);
    sim.registry.apply_settings(
        &mut sim.world,
        id,
        SettingsUpdate {
            search_radius: Some(14),
            strip_output: Some(false),
            ..SettingsUpdate::default()
        },
    );

    // "Reload": a fresh session over the same world state.
    let world = sim.world;
    let mut reloaded = Simulation::new(SimConfig::default(), world);
    reloaded.handle(SimEvent::BodyLoaded { id });

    assert_eq!(reloaded.registry.len(), 1);
    let agent = reloaded.registry.get(id).expect("agent reloaded");
    let record = agent.persisted();
    assert_eq!(record.search_radius, Some(14));
    assert!(!record.strip_output);
    assert_eq!(record.anchor, GridPos::new(0, 0, 0));

    // A body with no persisted schema cannot be operated.
    reloaded.handle(SimEvent::BodyLoaded { id: 99 });
    assert_eq!(reloaded.registry.len(), 1);
}

#[test]
fn unloaded_anchor_region_stalls_the_cycle_until_reloaded() {
    let mut sim = demo_sim();
    sim.world.set_chunk_loaded((0, 0), false);

    sim.run(300);
    assert!(sim.world.delivered_totals().is_empty());

    sim.world.set_chunk_loaded((0, 0), true);
    // The long anchor hold has to elapse before the cycle resumes.
    sim.run(2_600);
    assert_eq!(
        sim.world.delivered_totals().get("grove:bare_trunk"),
        Some(&3)
    );
}

#[test]
fn config_loads_from_yaml_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "seed: 42\ntuning:\n  search_radius: 14").expect("write config");

    let config = SimConfig::load(file.path()).expect("config loads");
    assert_eq!(config.seed, 42);
    assert_eq!(config.tuning.search_radius, 14);
    // Unspecified keys fall back to their defaults.
    assert_eq!(config.tuning.path_budget, 300);
    assert_eq!(config.profile.anchor_type, "grove:post");
}
