//! Chansim command line
//!
//! Build a network from a JSON config, run random transfers and export the
//! resulting snapshot.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chansim_sim::{Simulation, SimulationConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chansim")]
#[command(about = "Payment-channel network simulator")]
struct Args {
    /// JSON simulation config; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of transfers, overriding the config
    #[arg(short, long)]
    transfers: Option<usize>,

    /// Fraction of nodes to freeze before the transfers run
    #[arg(short, long)]
    freeze: Option<f64>,

    /// Write the final network snapshot as JSON
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Write the event timeline as JSON
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let transfers = args.transfers.unwrap_or(config.transfers.count);

    println!("Chansim");
    println!("=======");
    println!();
    println!("Building network with {} nodes...", config.num_nodes);

    let mut sim = Simulation::new(config)?;
    let report = &sim.network().report;
    println!("  Nodes: {} ({} pruned)", sim.node_count(), report.pruned.len());
    println!("  Channels: {}", sim.channel_count());
    println!("  Exhausted joins: {}", report.exhausted());

    if let Some(fraction) = args.freeze {
        let frozen = sim.freeze(fraction)?;
        println!("  Frozen nodes: {}", frozen.len());
    }

    println!();
    println!("Running {} transfers...", transfers);
    let summary = sim.run_transfers(transfers)?;
    println!(
        "  Succeeded: {}/{} ({:.1}%)",
        summary.succeeded,
        summary.attempted,
        summary.success_rate * 100.0
    );
    println!("  Mean hops: {:.2}", summary.mean_hops);
    println!("  Mean fee: {:.4}", summary.mean_fee);
    println!("  Mean paths searched: {:.1}", summary.mean_searched);

    if let Some(path) = &args.snapshot {
        fs::write(path, serde_json::to_string_pretty(&sim.snapshot())?)?;
        info!("snapshot written to {}", path.display());
    }
    if let Some(path) = &args.events {
        fs::write(path, serde_json::to_string_pretty(sim.events())?)?;
        info!("{} events written to {}", sim.event_count(), path.display());
    }

    Ok(())
}
