//! Grove CLI - headless harvester simulation driver.
//!
//! `grove run` builds a small demo grove, drives the simulation for a fixed
//! number of ticks, and prints what the agents delivered.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use grove_grid::GridPos;
use grove_sim::{MapWorld, SimConfig, SimEvent, Simulation};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Tick-based harvester agent simulation", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo grove headlessly
    Run {
        /// Simulation steps to drive
        #[arg(long, default_value = "4000")]
        ticks: u64,

        /// Optional YAML config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit the final summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Some(Commands::Run {
            ticks,
            config,
            json,
        }) => run_demo(ticks, config, json),
        None => {
            println!("Grove - tick-based harvester agent simulation");
            println!();
            println!("Usage: grove run [--ticks N] [--config FILE] [--json]");
            Ok(())
        }
    }
}

fn run_demo(ticks: u64, config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => SimConfig::load(&path)?,
        None => SimConfig::default(),
    };

    let world = demo_world(&config);
    let mut sim = Simulation::new(config, world);
    sim.handle(SimEvent::ManagerPlaced {
        pos: GridPos::new(0, 0, 0),
    });

    info!(ticks, "driving demo grove");
    sim.run(ticks);

    let summary = sim.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("ran {} ticks with {} agent(s)", summary.ticks, summary.agents);
    if summary.delivered.is_empty() {
        println!("nothing delivered yet");
    } else {
        println!("delivered:");
        for (resource, amount) in &summary.delivered {
            println!("  {resource}: {amount}");
        }
    }
    if !summary.carried.is_empty() {
        println!("still carried:");
        for (resource, amount) in &summary.carried {
            println!("  {resource}: {amount}");
        }
    }
    Ok(())
}

/// A bin beside the post-to-be and a few trees in range.
fn demo_world(config: &SimConfig) -> MapWorld {
    let mut world = MapWorld::new(32);

    world.put(GridPos::new(1, 0, 1), config.profile.container_type.clone());
    world.place_container(GridPos::new(1, 0, 1), 10_000);

    let trunk = config
        .profile
        .target_types
        .first()
        .cloned()
        .unwrap_or_else(|| "grove:trunk".to_string());
    let canopy = config
        .profile
        .canopy_types
        .first()
        .cloned()
        .unwrap_or_else(|| "grove:canopy".to_string());

    for base in [
        GridPos::new(6, 0, 2),
        GridPos::new(-5, 0, 4),
        GridPos::new(3, 0, -7),
    ] {
        for dy in 0..3 {
            world.put(base.offset(0, dy, 0), trunk.clone());
        }
        for offset in [(1, 2, 0), (-1, 2, 0), (0, 2, 1), (0, 2, -1), (0, 3, 0)] {
            world.put(base.offset(offset.0, offset.1, offset.2), canopy.clone());
        }
    }

    world
}
