//! MATCHGRID CLI - Command-line interface
//!
//! Commands:
//! - play: Interactive session over stdin
//! - simulate: Autoplay many seeded games and report statistics
//! - config: Write the default engine configuration

mod play;
mod simulate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use matchgrid_core::EngineConfig;

#[derive(Parser)]
#[command(name = "matchgrid")]
#[command(about = "Match-three grid engine")]
struct Cli {
    /// Random seed for reproducible boards
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Engine configuration JSON file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively (commands read from stdin)
    Play,
    /// Autoplay games with hinted swaps
    Simulate(simulate::SimulateArgs),
    /// Write the default configuration as JSON
    Config {
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for boards and JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play => {
            let config = load_config(cli.config.as_ref(), cli.seed)?;
            play::run(config)
        }
        Commands::Simulate(args) => {
            let config = load_config(cli.config.as_ref(), None)?;
            simulate::run(args, config, cli.seed)
        }
        Commands::Config { output } => {
            EngineConfig::default()
                .save(&output)
                .with_context(|| format!("Failed to write config: {}", output.display()))?;
            tracing::info!("Wrote default config to {}", output.display());
            Ok(())
        }
    }
}

/// Read the config file if one was given, then apply the seed override
fn load_config(path: Option<&PathBuf>, seed: Option<u64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}
