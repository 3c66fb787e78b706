//! fieldnet simulator CLI.
//!
//! Runs one scenario or a seed sweep and prints the report as JSON.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fieldnet_sim::{run_scenario, sweep, Scenario};

#[derive(Parser)]
#[command(name = "fieldnet-sim")]
#[command(about = "Simulate sensor discovery and data collection by surveyor swarms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario.
    Run {
        /// Scenario file (JSON); defaults to the reference deployment
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// Override the simulated duration in seconds
        #[arg(short, long)]
        duration: Option<f64>,
        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Scatter this many extra sensors over the field
        #[arg(long)]
        random_sensors: Option<usize>,
    },

    /// Run the scenario once per seed in parallel.
    Sweep {
        /// Number of seeds, starting at 0
        #[arg(long, default_value = "8")]
        seeds: u64,
        /// Scenario file (JSON); defaults to the reference deployment
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// Scatter this many extra sensors over the field
        #[arg(long)]
        random_sensors: Option<usize>,
    },
}

fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    let scenario = match path {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::default(),
    };
    Ok(scenario)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            duration,
            seed,
            random_sensors,
        } => {
            let mut scenario = load_scenario(scenario.as_deref())?;
            if let Some(duration) = duration {
                scenario.duration = duration;
            }
            if let Some(seed) = seed {
                scenario.seed = seed;
            }
            if let Some(count) = random_sensors {
                scenario.random_sensors = count;
            }

            let report = run_scenario(scenario)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Sweep {
            seeds,
            scenario,
            random_sensors,
        } => {
            let mut scenario = load_scenario(scenario.as_deref())?;
            if let Some(count) = random_sensors {
                scenario.random_sensors = count;
            }

            let seeds: Vec<u64> = (0..seeds).collect();
            info!(runs = seeds.len(), "starting sweep");
            let report = sweep(&scenario, &seeds)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
