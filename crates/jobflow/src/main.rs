//! jobflow - guided workflow engine over SQLite routines
//!
//! Main entry point for the jobflow CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

mod client;
mod commands;

use commands::{check, config, start, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// jobflow - guided workflow engine over SQLite routines
#[derive(Parser)]
#[command(name = "jobflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: http://localhost:5090)
    #[arg(long, global = true, env = "JOBFLOW_SERVER_URL")]
    pub server: Option<String>,

    /// Path to config file (overrides default discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the jobflow server
    Start(start::StartArgs),

    /// Show server status and store liveness
    Status(status::StatusArgs),

    /// Check the local database without starting a server
    Check(check::CheckArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit --config file must parse; discovered layers only warn.
    let loaded = match cli.config {
        Some(ref path) => jobflow_config::LoadedConfig::from_file(path)?,
        None => jobflow_config::load_config(None)?,
    };

    let _guard = init_tracing(&loaded, cli.verbose);

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let server_url = cli.server.unwrap_or_else(|| {
        let server = loaded.config.server();
        let host = match server.bind.as_str() {
            "0.0.0.0" => "localhost",
            bind => bind,
        };
        format!("http://{}:{}", host, server.port)
    });

    // Create context for commands
    let ctx = commands::Context {
        server_url,
        json_output: cli.json,
        verbose: cli.verbose,
        loaded,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Check(args) => check::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console (human-readable) plus, when enabled, a daily-rotating JSON file.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(loaded: &jobflow_config::LoadedConfig, verbose: bool) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let filter = if verbose {
        "jobflow=debug,jobflow_engine=debug,jobflow_store=debug,jobflow_server=debug,jobflow_config=debug,tower_http=debug,info"
    } else {
        "jobflow=info,jobflow_engine=info,jobflow_store=info,jobflow_server=info,warn"
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(tracing_subscriber::EnvFilter::new(filter));

    let logging = loaded.config.logging();
    if !logging.json {
        tracing_subscriber::registry().with(console).init();
        return None;
    }

    let log_dir = match loaded.base_dir() {
        Some(base) if logging.dir.is_relative() => base.join(&logging.dir),
        _ => logging.dir.clone(),
    };
    let file_appender = tracing_appender::rolling::daily(&log_dir, "jobflow.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "jobflow=trace,jobflow_engine=trace,jobflow_store=trace,jobflow_server=trace,jobflow_config=trace,tower_http=debug,info",
                )),
        )
        .init();

    Some(guard)
}
