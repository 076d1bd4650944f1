use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pairpool::application::{Cli, CommandExecutor};
use pairpool::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load base configuration from file if provided, defaults otherwise
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // RUST_LOG wins over the configured filter; logs go to stderr so the
    // JSON report on stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("invalid logging filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    CommandExecutor::execute(cli.command, config)
        .await
        .context("command failed")
}
