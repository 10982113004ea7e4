mod cli;
mod commands;
mod error;
mod gallery;
mod mcp;
mod order;
mod page_range;
mod pdf;
mod resolve;
mod selection;
mod source;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output and the MCP transport, so logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Merge {
            selection,
            layout,
            output,
            dry_run,
        } => {
            commands::merge::run(&selection, layout, output.as_deref(), dry_run)?;
        }
        Commands::Gallery {
            selection,
            output,
            preview_chars,
        } => {
            commands::gallery::run(&selection, output.as_deref(), preview_chars)?;
        }
    }

    Ok(())
}
