//! edgesim Simulation Engine CLI
//!
//! Runs one or more placement algorithms against the same topology and
//! prints a comparison table.

use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edgesim_engine::{
    AllServicesPlaced, HaltReason, JsonTopologyFile, PlacementStrategy, SimulationConfig,
    SimulationResult, Simulator, SyntheticTopology, TopologySource,
};

/// Tick bound used when neither the flag nor the config file sets one
const DEFAULT_MAX_TICKS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "edgesim-sim")]
#[command(about = "Simulate edge service placement algorithms", long_about = None)]
struct Args {
    /// Topology JSON file (synthetic topology if omitted)
    #[arg(short, long)]
    topology: Option<PathBuf>,

    /// Number of edge servers to generate
    #[arg(long, default_value_t = 10)]
    hosts: usize,

    /// Number of services to generate
    #[arg(long, default_value_t = 50)]
    services: usize,

    /// Seed for the synthetic topology
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Algorithms to compare
    #[arg(
        short,
        long = "algorithm",
        value_enum,
        value_delimiter = ',',
        default_values_t = [
            PlacementStrategy::FirstFit,
            PlacementStrategy::BestFit,
            PlacementStrategy::WorstFit,
            PlacementStrategy::Optimal,
            PlacementStrategy::Consolidation,
        ]
    )]
    algorithms: Vec<PlacementStrategy>,

    /// Engine configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Safety tick bound (overrides the config file)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Output JSON file path (optional)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write logs to <dir>/edgesim-sim.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let (file_writer, _guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, "edgesim-sim.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edgesim=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
        }))
        .init();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(max_ticks) = args.max_ticks {
        config = config.with_max_ticks(max_ticks);
    } else if config.max_ticks.is_none() {
        config = config.with_max_ticks(DEFAULT_MAX_TICKS);
    }

    let source: Box<dyn TopologySource> = match &args.topology {
        Some(path) => Box::new(JsonTopologyFile::new(path)),
        None => Box::new(SyntheticTopology::new(args.hosts, args.services, args.seed)),
    };

    println!("edgesim placement simulation");
    println!("  Topology: {}", source.describe());
    println!(
        "  Tick bound: {} (tick = {} {})",
        config.max_ticks.unwrap_or(DEFAULT_MAX_TICKS),
        config.tick_duration,
        config.tick_unit
    );
    println!("  Migration duration: {} tick(s)\n", config.migration_duration_ticks);

    let mut results: Vec<SimulationResult> = Vec::new();

    for strategy in &args.algorithms {
        let algorithm = strategy.build();
        let name = algorithm.name().to_string();
        print!("Running simulation with {} ... ", name);

        let mut simulator =
            Simulator::new(config.clone(), algorithm, Box::new(AllServicesPlaced))?;
        simulator.initialize(source.as_ref())?;

        match simulator.run_model() {
            Ok(result) => {
                println!("Done");
                results.push(result);
            }
            Err(e) => {
                println!("Failed");
                error!(algorithm = %name, error = %e, "Simulation aborted");
            }
        }
    }

    println!();
    println!(
        "{:<16} {:>8} {:>12} {:>8} {:>12} {:>12} {:>10}",
        "Algorithm", "Ticks", "Placed", "Hosts", "Migrations", "Rejected", "Halt"
    );
    println!("{}", "-".repeat(84));

    for result in &results {
        let migrations: usize = result.history.iter().map(|t| t.migrations_completed).sum();
        let rejected: usize = result.history.iter().map(|t| t.rejected_transitions).sum();
        let halt = match result.halt_reason {
            HaltReason::StoppingCriterion => "criterion",
            HaltReason::TickLimitReached => "tick limit",
        };

        println!(
            "{:<16} {:>8} {:>8}/{:<3} {:>8} {:>12} {:>12} {:>10}",
            result.algorithm,
            result.ticks,
            result.placed_services,
            result.total_services,
            result.active_hosts,
            migrations,
            rejected,
            halt,
        );
    }

    if let Some(output_path) = &args.output {
        let json = serde_json::to_string_pretty(&results)?;
        fs::write(output_path, json)
            .with_context(|| format!("Failed to write results to {}", output_path.display()))?;
        info!(path = %output_path.display(), runs = results.len(), "Results saved");
    }

    Ok(())
}
