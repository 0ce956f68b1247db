//! Start command - launches the jobflow server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use jobflow_engine::{EngineConfig, EngineServices};
use jobflow_server::{Server, ServerConfig};
use tracing::info;

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite database file (overrides config)
    #[arg(long, env = "JOBFLOW_DATABASE")]
    pub database: Option<PathBuf>,

    /// Commit writes made by condition routines (overrides config)
    #[arg(long)]
    pub commit_conditions: bool,

    /// Upper bound in seconds on each store interaction (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub store_timeout: Option<u64>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.loaded.config;

    if ctx.verbose {
        let sources = ctx.loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    // ── Store ───────────────────────────────────────────────────────────
    let db_path = ctx.database_path(args.database.as_ref());
    let store = ctx
        .open_store(args.database.as_ref())
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    // ── Engine ──────────────────────────────────────────────────────────
    let mut engine_config = EngineConfig::from(&config.engine());
    if args.commit_conditions {
        engine_config = engine_config.with_commit_conditions(true);
    }
    if let Some(secs) = args.store_timeout {
        engine_config = engine_config.with_store_timeout(Duration::from_secs(secs));
    }
    let engine = EngineServices::from_store(store, engine_config);

    // ── Server ──────────────────────────────────────────────────────────
    let mut server_file = config.server();
    if let Some(port) = args.port {
        server_file.port = port;
    }
    if let Some(bind) = args.bind {
        server_file.bind = bind;
    }
    let server_config = ServerConfig::from_config(&server_file)?;
    let addr: SocketAddr = server_config.bind_address;

    info!(
        database = %db_path.display(),
        addr = %addr,
        "Starting jobflow"
    );
    if !ctx.json_output {
        println!("jobflow listening on http://{}", addr);
    }

    Server::new(engine, server_config).run().await?;
    Ok(())
}
