//! Warm command - wake a sleeping backend

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{build_feed, BackendArgs};
use crate::config::Settings;

/// Arguments for the warm command
#[derive(Args)]
pub struct WarmArgs {
    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Execute the warm command
pub async fn execute(args: WarmArgs) -> Result<()> {
    let settings = Settings::load_or_default();
    let feed = build_feed(&settings, &args.backend)?;

    if feed.warm_up().await {
        info!("Backend answered the warm-up ping");
        println!("backend awake");
    } else {
        info!("Backend did not answer within {} ms", settings.warmup.timeout_ms);
        println!("backend not responding yet");
    }
    Ok(())
}
