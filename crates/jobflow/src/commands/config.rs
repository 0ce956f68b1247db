//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use jobflow_config::{self, JobflowConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./jobflow.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let config = &loaded.config;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("# jobflow Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let server = config.server();
    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    if !server.cors_origins.is_empty() {
        println!("  cors: {}", server.cors_origins.join(", "));
    }
    println!();

    println!("Database:");
    println!("  path: {}", ctx.database_path(None).display());
    println!();

    let engine = config.engine();
    println!("Engine:");
    println!("  store timeout: {}s", engine.store_timeout_secs);
    println!("  commit conditions: {}", engine.commit_conditions);
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded { "✓" } else { "·" };
        println!("  {} {}", status, source.path.display());
    }
    println!();

    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'jobflow config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("jobflow.toml")
    } else {
        jobflow_config::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine user config directory"))?
    };

    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }

    let config = JobflowConfig {
        server: Some(Default::default()),
        database: Some(Default::default()),
        engine: Some(Default::default()),
        logging: Some(Default::default()),
    };
    jobflow_config::save_config(&config, &path)?;
    println!("Created {}", path.display());

    Ok(())
}

fn cmd_path() -> Result<()> {
    match jobflow_config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("Could not determine config directory"),
    }
    Ok(())
}
