//! Summary command - print the daily summary grid

use anyhow::Result;
use clap::Args;

use super::{build_feed, BackendArgs};
use crate::config::Settings;

/// Arguments for the summary command
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Execute the summary command
pub async fn execute(args: SummaryArgs) -> Result<()> {
    let settings = Settings::load_or_default();
    let feed = build_feed(&settings, &args.backend)?;

    let summary = feed.summary(None).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    if summary.is_empty() {
        println!("(empty summary)");
        return Ok(());
    }

    let width = summary
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0);
    for entry in &summary.entries {
        println!("{:<width$}  {}", entry.label, entry.display, width = width);
    }
    Ok(())
}
