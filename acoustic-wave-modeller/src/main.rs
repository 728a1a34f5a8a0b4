use std::path::PathBuf;
use std::time::Instant;

use acoustic_wave_modeller::config::Config;
use acoustic_wave_modeller::output::{write_field, write_history};
use acoustic_wave_modeller::ProgressLogger;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 2D acoustic wave propagation with an explicit leapfrog scheme
#[derive(Parser)]
#[command(name = "acoustic-wave-modeller")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Keep every time step, not just the final field
    #[arg(long)]
    history: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = Config::from_file(&cli.config)?;
    info!("{}", config.summary());

    let mut sim = config.build()?;
    let logger = ProgressLogger::new(config.simulation.report_period, sim.params.steps());
    let record_history = cli.history || config.simulation.record_history;

    let start = Instant::now();
    if record_history {
        let history = sim.run_history(logger)?;
        info!(elapsed = ?start.elapsed(), frames = history.len(), "finished");
        if let Some(first) = history.summary.first_non_finite {
            warn!(step = first, "result contains non-finite values");
        }
        if let Some(path) = &config.output.history {
            write_history(path, history.frames.view())
                .with_context(|| format!("Failed to write history to '{}'", path))?;
            info!(path = %path, "history written");
        }
    } else {
        let summary = sim.run(logger);
        info!(elapsed = ?start.elapsed(), steps = summary.steps, "finished");
        if let Some(first) = summary.first_non_finite {
            warn!(step = first, "result contains non-finite values");
        }
    }

    if let Some(path) = &config.output.final_field {
        write_field(path, sim.pressure())
            .with_context(|| format!("Failed to write final field to '{}'", path))?;
        info!(path = %path, "final field written");
    }

    Ok(())
}
