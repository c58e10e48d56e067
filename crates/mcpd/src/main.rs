use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod daemon;
mod registry_cmds;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = cli
        .log_level
        .as_deref()
        .map(EnvFilter::new)
        .unwrap_or_else(EnvFilter::from_default_env);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();

    match cli.command {
        Commands::Daemon(args) => daemon::run(args).await,
        Commands::Search(args) => registry_cmds::run_search(args).await,
        Commands::Add(args) => registry_cmds::run_add(args),
    }
}
