//! Binary crate for the `tempcast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and prompting for missing input
//! - Interactive configuration
//! - Human-friendly output and chart rendering

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod chart;
mod cli;
mod output;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr so stdout stays usable for `--json`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "tempcast=debug,tempcast_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
