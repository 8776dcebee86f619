//! reporef
//!
//! An MCP server that lets models read configured Git repositories.
//!
//! # Usage
//!
//! ```bash
//! reporef [--home <dir>] [--git-timeout <secs>] [start|init]
//! ```
//!
//! # Environment Variables
//!
//! - `REPOREF_HOME`: Home directory (default: `~/.repo-ref`)
//! - `RUST_LOG`: Control log verbosity (default: `reporef=info`)
//!
//! Logs go to stderr; stdout carries the protocol.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use reporef_core::{Config, RepoService, initialize_all, spawn_prewarm};
use reporef_fs::{HomeLayout, layout::HOME_ENV_VAR};
use reporef_git::{GitTimeouts, RepoStore};
use reporef_mcp::ReporefServer;

/// MCP server giving models read access to configured Git repositories
#[derive(Parser)]
#[command(name = "reporef")]
#[command(version)]
struct Args {
    /// Home directory holding config.yml and repos/
    #[arg(long, env = HOME_ENV_VAR, global = true)]
    home: Option<PathBuf>,

    /// Timeout in seconds for network git commands (clone, fetch, pull)
    #[arg(long, default_value_t = 300, global = true)]
    git_timeout: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Pre-warm repositories in the background and serve MCP on stdio
    #[default]
    Start,
    /// Clone and update every configured repository, then exit
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout is reserved for the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("reporef=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let layout = HomeLayout::resolve(args.home)?;
    Config::ensure_file(&layout)?;
    let config = Config::load_or_default(&layout.config_path());
    tracing::info!(home = %layout.root().display(), repos = config.repos.len(), "Loaded configuration");

    let store = RepoStore::with_cli(layout, GitTimeouts::from_network_secs(args.git_timeout));
    let service = Arc::new(RepoService::new(config, store));

    match args.command.unwrap_or_default() {
        Command::Init => {
            let outcomes = initialize_all(&service).await;
            let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
            if failed > 0 {
                tracing::warn!(failed, "Some repositories failed to initialize");
            }
        }
        Command::Start => {
            let _prewarm = spawn_prewarm(Arc::clone(&service));
            ReporefServer::new(service).run().await?;
        }
    }

    Ok(())
}
