//! Status command - shows server status and store liveness.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use super::Context;
use crate::client::Client;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also ask the server to round-trip its database
    #[arg(short, long)]
    pub detailed: bool,
}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    running: bool,
    version: Option<String>,
    database: Option<String>,
    server_url: String,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let client = Client::new(&ctx.server_url)?;

    match client.health().await {
        Ok(health) => {
            let liveness = if args.detailed {
                Some(client.liveness().await)
            } else {
                None
            };

            if ctx.json_output {
                let output = StatusOutput {
                    running: true,
                    version: Some(health.version.clone()),
                    database: liveness.as_ref().map(|l| match l {
                        Ok(l) => l.status.clone(),
                        Err(_) => "unreachable".to_string(),
                    }),
                    server_url: ctx.server_url.clone(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            let green = Style::new().green();
            let red = Style::new().red();
            let dim = Style::new().dim();

            println!();
            println!("{}", style("jobflow Server Status").bold());
            println!("{}", dim.apply_to("─".repeat(40)));
            println!();
            println!(
                "  {} {}",
                dim.apply_to("Status:"),
                green.apply_to("● running")
            );
            println!("  {} {}", dim.apply_to("Version:"), health.version);
            println!("  {} {}", dim.apply_to("Server:"), ctx.server_url);

            match liveness {
                Some(Ok(l)) if l.status == "success" => {
                    println!("  {} {}", dim.apply_to("Database:"), green.apply_to("● ok"));
                }
                Some(Ok(l)) => {
                    println!(
                        "  {} {} {}",
                        dim.apply_to("Database:"),
                        red.apply_to("● error"),
                        l.message
                    );
                }
                Some(Err(e)) => {
                    println!(
                        "  {} {} {}",
                        dim.apply_to("Database:"),
                        red.apply_to("● unreachable"),
                        e
                    );
                }
                None => {}
            }

            println!();
        }
        Err(e) => {
            if ctx.json_output {
                let output = StatusOutput {
                    running: false,
                    version: None,
                    database: None,
                    server_url: ctx.server_url.clone(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let red = Style::new().red();
                let dim = Style::new().dim();

                println!();
                println!("{}", style("jobflow Server Status").bold());
                println!("{}", dim.apply_to("─".repeat(40)));
                println!();
                println!(
                    "  {} {}",
                    dim.apply_to("Status:"),
                    red.apply_to("● not running")
                );
                println!("  {} {}", dim.apply_to("Server:"), ctx.server_url);

                if ctx.verbose {
                    println!();
                    println!("  {} {}", dim.apply_to("Error:"), e);
                }

                println!();
                println!("  {}", dim.apply_to("Start the server with: jobflow start"));
                println!();
            }
        }
    }

    Ok(())
}
