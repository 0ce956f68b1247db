//! Check command - opens the local database and verifies it answers.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use jobflow_engine::{EngineConfig, EngineServices};
use serde::Serialize;

use super::Context;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// SQLite database file (overrides config)
    #[arg(long, env = "JOBFLOW_DATABASE")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    database: String,
    ok: bool,
    workflows: usize,
}

/// Run the check command.
///
/// Opening the store applies pending migrations.
pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let path = ctx.database_path(args.database.as_ref());
    let store = ctx.open_store(args.database.as_ref())?;
    let engine = EngineServices::from_store(store, EngineConfig::from(&ctx.loaded.config.engine()));

    engine.controller().ping().await?;
    let workflows = engine.controller().list_workflows().await?;

    if ctx.json_output {
        let output = CheckOutput {
            database: path.display().to_string(),
            ok: true,
            workflows: workflows.len(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let green = Style::new().green();
    let dim = Style::new().dim();

    println!();
    println!("{}", style("jobflow Database Check").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Database:"), path.display());
    println!("  {} {}", dim.apply_to("Status:"), green.apply_to("● ok"));
    println!("  {} {}", dim.apply_to("Workflows:"), workflows.len());
    if ctx.verbose {
        for workflow in &workflows {
            println!("    {:>4}  {}", workflow.id, workflow.name);
        }
    }
    println!();

    Ok(())
}
