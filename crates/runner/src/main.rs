use clap::{Parser, Subcommand};
use log::info;
use meridian_ledger::journal;
use meridian_runner::{RunConfig, Simulation, load_observations, write_window_journals};
use std::path::PathBuf;

/// Meridian capital-allocation engine
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON run configuration (defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recorded observations (JSON lines) instead of the synthetic market
    #[arg(long)]
    observations: Option<PathBuf>,

    /// Directory for ledger journals
    #[arg(long)]
    journal_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk-forward evaluation (default)
    WalkForward,
    /// One decision-loop run over the whole timeline
    Run,
    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            RunConfig::load(path)?
        }
        None => RunConfig::default(),
    };

    let mut simulation = Simulation::new(config);
    if let Some(path) = &args.observations {
        let observations = load_observations(path)?;
        info!("Loaded {} observations from {}", observations.len(), path.display());
        simulation = simulation.with_observations(observations);
    }

    match args.command.unwrap_or(Command::WalkForward) {
        Command::WalkForward => {
            let report = simulation.walk_forward()?;
            if let Some(dir) = &args.journal_dir {
                write_window_journals(&report, dir)?;
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Run => {
            let run = simulation.single_run()?;
            if let Some(dir) = &args.journal_dir {
                std::fs::create_dir_all(dir)?;
                journal::save(dir.join("run.jsonl"), &run.journal)?;
            }
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Config => {
            println!("{}", simulation.config().to_json()?);
        }
    }
    Ok(())
}
