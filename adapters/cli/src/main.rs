#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless arena director session.
//!
//! The binary stands in for the game scene: it spawns simulated encounters,
//! feeds scripted player and enemy events into the wave lifecycle, and prints
//! a per-wave report showing how the difficulty loop responded.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

mod session;

/// Arguments accepted by the headless session driver.
#[derive(Debug, Parser)]
#[command(name = "arena-director", about = "Headless adaptive-difficulty session driver")]
struct Args {
    /// Number of waves to simulate before exiting.
    #[arg(long, default_value_t = 8)]
    waves: u32,

    /// Seed for the scripted player and enemy models.
    #[arg(long, default_value_t = 0x5eed_cafe)]
    seed: u64,

    /// Scheduling tick length in milliseconds.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Scripted player skill in [0, 1]; higher skill clears waves faster.
    #[arg(long, default_value_t = 0.6)]
    skill: f32,

    /// Optional TOML file overriding the default director configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Entry point for the arena director command-line interface.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = session::load_config(args.config.as_deref())?;
    let options = session::SessionOptions {
        waves: args.waves,
        seed: args.seed,
        tick: Duration::from_millis(args.tick_ms.max(1)),
        skill: args.skill.clamp(0.0, 1.0),
    };

    let report = session::run(config, &options)?;
    session::print_report(&report);
    Ok(())
}
