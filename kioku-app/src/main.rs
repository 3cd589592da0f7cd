mod api;
mod cli;
mod config;
mod demo;
mod export;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use cli::commands::run_cli;
use cli::opts::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kioku=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let rt = Runtime::new()?;
    rt.block_on(run_cli(args))
}
