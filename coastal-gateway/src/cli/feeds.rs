//! Waves and tides commands - fetch, normalize and print a series

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Args;
use tracing::info;

use super::{build_feed, BackendArgs};
use crate::config::Settings;
use crate::feed::DayRange;
use coastal_common::display::{
    ddmm_hhmm, format_direction, format_number, hhmm, is_multi_day, upcoming_tide_events, MISSING,
};
use coastal_common::schema::{CanonicalObservation, CanonicalTideEvent};
use coastal_common::time::Instant;

/// Arguments for the waves and tides commands
#[derive(Args)]
pub struct FeedArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// First day (YYYY-MM-DD); without --start or --end, today with local offsets
    #[arg(long)]
    pub start: Option<String>,

    /// Last day (YYYY-MM-DD), defaults to the start day
    #[arg(long)]
    pub end: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl FeedArgs {
    /// True when no dates were given and the zoned "today" range applies
    fn is_today(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn range(&self) -> Result<DayRange> {
        let today = DayRange::today().start.format("%Y-%m-%d").to_string();
        let start = self.start.clone().unwrap_or(today);
        let end = self.end.clone().unwrap_or_else(|| start.clone());
        DayRange::parse(&start, &end)
            .with_context(|| format!("Invalid date range {} .. {} (expected YYYY-MM-DD)", start, end))
    }
}

/// Execute the waves command
pub async fn execute_waves(args: FeedArgs) -> Result<()> {
    let range = args.range()?;
    let settings = Settings::load_or_default();
    let feed = build_feed(&settings, &args.backend)?;

    info!("Fetching waves {} .. {}", range.start, range.end);
    let series = if args.is_today() {
        feed.waves_zoned(&range, None).await?
    } else {
        feed.waves(&range, None).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print_waves(&series);
    }
    Ok(())
}

/// Execute the tides command
pub async fn execute_tides(args: FeedArgs) -> Result<()> {
    let range = args.range()?;
    let settings = Settings::load_or_default();
    let feed = build_feed(&settings, &args.backend)?;

    info!("Fetching tides {} .. {}", range.start, range.end);
    let events = if args.is_today() {
        feed.tides_zoned(&range, None).await?
    } else {
        feed.tides(&range, None).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        print_tides(&events, Utc::now());
    }
    Ok(())
}

fn time_label(time: Option<Instant>, multi_day: bool) -> String {
    match time {
        Some(t) if multi_day => ddmm_hhmm(&t, &Local),
        Some(t) => hhmm(&t, &Local),
        None => MISSING.to_string(),
    }
}

fn with_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(_) => format!("{} {}", format_number(value), unit),
        None => MISSING.to_string(),
    }
}

fn print_waves(series: &[CanonicalObservation]) {
    if series.is_empty() {
        println!("(no observations)");
        return;
    }
    let multi_day = is_multi_day(series, &Local);
    println!(
        "{:<12} {:>8} {:>8} {:>10} {:>9} {:>9} {:>9} {:>10}",
        "time", "hs", "tp", "dir", "sst", "air", "wind", "wind dir"
    );
    for obs in series {
        println!(
            "{:<12} {:>8} {:>8} {:>10} {:>9} {:>9} {:>9} {:>10}",
            time_label(obs.time, multi_day),
            with_unit(obs.hs, "m"),
            with_unit(obs.tp, "s"),
            format_direction(obs.dp),
            with_unit(obs.sst, "°C"),
            with_unit(obs.air, "°C"),
            with_unit(obs.ws, "m/s"),
            format_direction(obs.wd),
        );
    }
}

fn print_tides(events: &[CanonicalTideEvent], now: Instant) {
    if events.is_empty() {
        println!("(no tide data)");
        return;
    }
    let multi_day = is_multi_day(events, &Local);
    println!("{:<12} {:>8} {:<10}", "time", "height", "type");
    for event in events {
        println!(
            "{:<12} {:>8} {:<10}",
            time_label(event.time, multi_day),
            with_unit(event.height, "m"),
            event.kind.as_ref().map(|k| k.label()).unwrap_or(""),
        );
    }

    let upcoming = upcoming_tide_events(events, now, 2);
    if !upcoming.is_empty() {
        println!();
        for event in upcoming {
            println!(
                "next {:<6} {} {}",
                event.kind.as_ref().map(|k| k.label()).unwrap_or(""),
                time_label(event.time, true),
                with_unit(event.height, "m"),
            );
        }
    }
}
