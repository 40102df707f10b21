//! riskgate: credit-risk scoring CLI
//!
//! Trains a gradient-boosted default model on a loan-application dataset and
//! serves approve/deny decisions with a configurable risk threshold.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use riskgate::cli::{run_score, run_serve, run_train, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The server logs requests by default; the batch commands stay quiet
    let default_filter = match cli.command {
        Commands::Serve(_) => "info",
        Commands::Train(_) | Commands::Score(_) => "warn",
    };
    init_tracing(default_filter);

    match &cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Serve(args) => run_serve(args),
        Commands::Score(args) => run_score(args),
    }
}

/// Log to stderr, honouring `RUST_LOG` when set
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
