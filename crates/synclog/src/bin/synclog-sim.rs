//! synclog-sim: run a lossy log sync simulation to convergence.
//!
//! Loads an optional JSON config, applies command-line overrides, runs the
//! sequential or concurrent driver, verifies every log and prints a report.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use synclog::SimulationConfig;

#[derive(Parser)]
#[command(name = "synclog-sim")]
#[command(about = "Simulate append-only log sync over a lossy channel")]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of agents (overrides config file)
    #[arg(short, long)]
    agents: Option<usize>,

    /// Generation rounds (overrides config file)
    #[arg(short, long)]
    rounds: Option<u64>,

    /// Seed for reproducible loss patterns
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many settle rounds
    #[arg(long)]
    max_settle_rounds: Option<u64>,

    /// Run each agent as its own task over the in-memory transport
    #[arg(long)]
    concurrent: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig::default(),
        };

        if let Some(agents) = self.agents {
            config.agents = agents;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_settle_rounds.is_some() {
            config.max_settle_rounds = self.max_settle_rounds;
        }
        if self.concurrent {
            config.concurrent = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("synclog=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    if config.drop.blocks_convergence() && config.max_settle_rounds.is_none() {
        bail!("probe or response drop probability is 1.0; set --max-settle-rounds");
    }

    info!(
        agents = config.agents,
        rounds = config.rounds,
        concurrent = config.concurrent,
        "Starting synclog-sim"
    );

    let report = synclog::run(config).await?;

    println!("{}", report);
    Ok(())
}
