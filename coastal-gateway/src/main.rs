//! Coastal gateway CLI
//!
//! Provides commands for:
//! - `serve`: Run the same-origin proxy server
//! - `waves`: Fetch and print normalized wave observations
//! - `tides`: Fetch and print normalized tide events
//! - `summary`: Print the daily summary
//! - `warm`: Ping the backend once

use anyhow::Result;
use clap::Parser;

use coastal_common::logging::{init_logging, LogConfig};
use coastal_gateway::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging(LogConfig::from_env().with_app_name("coastal"))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Serve(args) => {
            coastal_gateway::cli::serve::execute(args).await?;
        }
        Commands::Waves(args) => {
            coastal_gateway::cli::feeds::execute_waves(args).await?;
        }
        Commands::Tides(args) => {
            coastal_gateway::cli::feeds::execute_tides(args).await?;
        }
        Commands::Summary(args) => {
            coastal_gateway::cli::summary::execute(args).await?;
        }
        Commands::Warm(args) => {
            coastal_gateway::cli::warm::execute(args).await?;
        }
    }

    Ok(())
}
