//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcpd", version, about = "Control plane for a fleet of MCP servers")]
pub struct Cli {
    /// Log filter, e.g. `info` or `mcpd_fleet=debug`. Falls back to
    /// RUST_LOG when omitted.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the daemon in the foreground.
    Daemon(DaemonArgs),
    /// Search a registry manifest for installable servers.
    Search(SearchArgs),
    /// Add or replace a server entry in the static config.
    Add(AddArgs),
}

#[derive(Args)]
pub struct DaemonArgs {
    /// Static server catalogue (default: ~/.config/mcpd/config.toml).
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Execution contexts (default: ~/.config/mcpd/secrets.toml).
    #[arg(long)]
    pub secrets_file: Option<PathBuf>,

    /// Gateway bind address.
    #[arg(long, default_value = "127.0.0.1:8090")]
    pub addr: SocketAddr,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Substring matched against server names and descriptions.
    pub query: String,

    /// Manifest URL to search.
    #[arg(long)]
    pub registry_url: String,

    /// Directory for cached manifests (default: platform cache dir).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Always fetch from the registry, never touch the cache.
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Server name.
    pub name: String,

    /// Package in `<runtime>::<package@version>` form.
    pub package: String,

    /// Allowed tool; repeat per tool.
    #[arg(long = "tool", required = true)]
    pub tools: Vec<String>,

    /// Static config to modify (default: ~/.config/mcpd/config.toml).
    #[arg(long)]
    pub config_file: Option<PathBuf>,
}
