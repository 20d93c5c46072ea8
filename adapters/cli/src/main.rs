#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Chipway level headlessly.

mod cues;
mod grid;
mod script;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use chipway_simulation::{Simulation, SimulationConfig};
use chipway_system_chase as chase;
use chipway_system_wander as wander;
use chipway_world::{query, Level, LevelStatus};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cues::AudioCues;
use script::InputScript;

/// Runs a level with scripted input and reports the outcome.
#[derive(Debug, Parser)]
#[command(name = "chipway", version, about)]
struct Args {
    /// Path to the TOML level file.
    #[arg(long)]
    level: PathBuf,
    /// Maximum number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Tick length in milliseconds.
    #[arg(long, default_value_t = 16)]
    dt: u64,
    /// Moves fed while the player is idle: U/D/L/R step, u/d/l/r dash,
    /// `.` waits and `!` dashes in the last direction.
    #[arg(long, default_value = "")]
    script: String,
    /// Seed for wandering enemies.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Print the grid after the run.
    #[arg(long)]
    print_grid: bool,
}

/// Entry point for the Chipway command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let source = fs::read_to_string(&args.level)
        .with_context(|| format!("failed to read level file {}", args.level.display()))?;
    let level = Level::from_toml_str(&source)
        .with_context(|| format!("failed to load level {}", args.level.display()))?;
    let script = InputScript::parse(&args.script).context("invalid --script")?;

    run(level, script, &args)
}

fn run(level: Level, mut script: InputScript, args: &Args) -> Result<()> {
    let config = SimulationConfig::new(
        chase::Config::default(),
        wander::Config::default().with_seed(args.seed),
    );
    let mut simulation = Simulation::new(level, config);
    let mut cues = AudioCues::default();
    let dt = Duration::from_millis(args.dt);

    let mut ticks = 0;
    while ticks < args.ticks {
        let idle = query::player(simulation.world()).is_some_and(|player| !player.is_moving());
        let frame = script.next_frame(idle);
        let events = simulation.tick(&frame, dt, &mut cues);
        ticks += 1;
        for event in &events {
            debug!(tick = ticks, ?event, "event");
        }
        if query::status(simulation.world()) != LevelStatus::Playing {
            break;
        }
    }

    let world = simulation.world();
    let progress = query::win_progress(world);
    info!(
        ticks,
        script_finished = script.is_finished(),
        cues = cues.played(),
        "run finished"
    );
    if args.print_grid {
        print!("{}", grid::render(world));
    }
    println!(
        "{}: {:?} after {ticks} ticks, chips {}/{}, goal {}",
        query::level(world).name(),
        query::status(world),
        progress.collected,
        progress.total,
        if progress.goal_reached { "reached" } else { "not reached" },
    );
    if let Some((scene, delay)) = cues.scene_request() {
        println!("next scene: {scene} in {} ms", delay.as_millis());
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
