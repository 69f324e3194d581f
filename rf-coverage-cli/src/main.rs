//! Command-line front end: reads a floor plan, runs the coverage simulation, and writes the
//! result bundle to disk (or prints a summary).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::Point2;
use serde::Deserialize;

use rf_coverage_adapters::floorplan::parse_floor_plan;
use rf_coverage_adapters::sink::{JsonFileSink, NullSink, ResultSink};
use rf_coverage_core::prelude::*;

/// On-disk shape for `--budgets`: run budgets plus the optional policy toggles.
#[derive(Debug, Deserialize)]
struct BudgetsFile {
    budgets: Budgets,
    #[serde(default)]
    policy: PropagationPolicy,
}

/// Runs the 2D ray-launching RF coverage simulator against a floor plan.
#[derive(Parser, Debug)]
#[command(name = "rf-coverage", version, about)]
struct Cli {
    /// Path to a JSON floor-plan document (`{width, height, walls: [...]}`).
    #[arg(long)]
    floor_plan: PathBuf,

    /// Transmitter x coordinate, meters.
    #[arg(long)]
    tx_x: f64,

    /// Transmitter y coordinate, meters.
    #[arg(long)]
    tx_y: f64,

    /// Transmit power, Watts.
    #[arg(long, default_value_t = 0.03)]
    tx_power: f64,

    /// Carrier frequency, Hz.
    #[arg(long, default_value_t = 2.4e9)]
    frequency: f64,

    /// Number of primary rays launched around the transmitter.
    #[arg(long, default_value_t = 360)]
    num_rays: u32,

    /// Maximum number of reflections a ray may accumulate before terminating.
    #[arg(long, default_value_t = 2)]
    max_reflections: u32,

    /// Maximum number of transmissions (wall crossings) a ray may accumulate before terminating.
    #[arg(long, default_value_t = 1)]
    max_transmissions: u32,

    /// Path-loss budget (linear, unitless) beyond which a ray terminates.
    #[arg(long, default_value_t = 1e6)]
    max_path_loss: f64,

    /// Receiver grid resolution per axis.
    #[arg(long, default_value_t = 50)]
    resolution: u32,

    /// Run ray launch and grid fill using rayon across all available cores.
    #[arg(long)]
    parallel: bool,

    /// Path to a JSON file of `{ "budgets": {...}, "policy": {...} }`. When given, this
    /// replaces the individual budget flags above entirely.
    #[arg(long)]
    budgets: Option<PathBuf>,

    /// Where to write the run output as JSON. Omit to print a summary instead.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv). Overrides RUST_LOG when present.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let floor_plan_json = std::fs::read_to_string(&cli.floor_plan)
        .with_context(|| format!("reading floor plan at {}", cli.floor_plan.display()))?;
    let (dimensions, walls) = parse_floor_plan(&floor_plan_json).context("parsing floor plan")?;

    let environment = Environment::with_walls(dimensions, walls).context("building environment")?;
    let antenna = Antenna::new(Point2::new(cli.tx_x, cli.tx_y), cli.tx_power, cli.frequency)
        .context("building antenna")?;

    let (budgets, policy) = match &cli.budgets {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading budgets file at {}", path.display()))?;
            let file: BudgetsFile = serde_json::from_str(&json).context("parsing budgets file")?;
            (file.budgets, file.policy)
        }
        None => {
            let budgets = Budgets {
                num_rays: cli.num_rays,
                max_reflections: cli.max_reflections,
                max_transmissions: cli.max_transmissions,
                max_path_loss: cli.max_path_loss,
                resolution: cli.resolution,
                parallel: cli.parallel,
                ..Budgets::default()
            };
            (budgets, PropagationPolicy::default())
        }
    };

    let simulation = Simulation::new(environment, antenna, budgets, policy)
        .context("validating simulation budgets")?;

    let output = simulation
        .run(&mut NullProgress, &CancellationToken::new())
        .context("running coverage simulation")?;

    let sink: Box<dyn ResultSink> = match &cli.output {
        Some(path) => Box::new(JsonFileSink::new(path)),
        None => Box::new(NullSink),
    };
    sink.publish(&output).context("publishing run output")?;

    if cli.output.is_none() {
        print_summary(&output);
    }

    Ok(())
}

fn print_summary(output: &RunOutput) {
    let flat: Vec<f64> = output.received_power.iter().flatten().copied().collect();
    let min = flat.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = flat.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = flat.iter().sum::<f64>() / flat.len() as f64;

    println!("rays terminated: {}", output.rays.len());
    println!("walls: {}", output.walls.len());
    println!("skipped rays: {}", output.skipped_rays);
    println!("received power (dBm): min={min:.1} max={max:.1} mean={mean:.1}");
}

fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let default_directive = match verbosity {
        0 => "rf_coverage_cli=info,rf_coverage_core=info",
        1 => "rf_coverage_cli=debug,rf_coverage_core=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
