//! Command-line interface
//!
//! Provides CLI commands for the coastal gateway.

pub mod feeds;
pub mod serve;
pub mod summary;
pub mod warm;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::config::{BackendConfig, Settings};
use crate::feed::{CoastalFeed, FeedRoute};
use crate::fetcher::ResilientFetcher;

/// Coastal gateway CLI
#[derive(Parser)]
#[command(name = "coastal")]
#[command(about = "Resilient proxy and feed client for coastal wave and tide observations")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the same-origin proxy server
    Serve(serve::ServeArgs),
    /// Fetch, normalize and print wave observations
    Waves(feeds::FeedArgs),
    /// Fetch, normalize and print tide readings and events
    Tides(feeds::FeedArgs),
    /// Print the daily summary
    Summary(summary::SummaryArgs),
    /// Ping the backend health endpoint once
    Warm(warm::WarmArgs),
}

/// Backend selection shared by the client commands
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Backend base URL (overrides settings and environment)
    #[arg(long)]
    pub backend: Option<String>,

    /// Route requests through a running proxy at this origin
    #[arg(long, value_name = "URL")]
    pub via_proxy: Option<String>,
}

/// Resolve the backend origin, honouring a `--backend` override
pub fn resolve_backend(settings: &Settings, override_url: Option<&str>) -> Result<Arc<BackendConfig>> {
    let backend = match override_url {
        Some(url) => BackendConfig::from_url(url),
        None => BackendConfig::from_env(&settings.backend),
    }
    .context("Failed to resolve backend URL")?;
    tracing::info!("Backend: {} ({})", backend, backend.source());
    Ok(Arc::new(backend))
}

/// Build a feed client from settings and CLI flags
pub fn build_feed(settings: &Settings, args: &BackendArgs) -> Result<CoastalFeed> {
    let backend = resolve_backend(settings, args.backend.as_deref())?;
    let fetcher = ResilientFetcher::with_reqwest(settings.fetch.policy())?;

    let route = match &args.via_proxy {
        Some(origin) => FeedRoute::Proxy {
            origin: Url::parse(origin).with_context(|| format!("Invalid proxy origin '{}'", origin))?,
            route: settings.proxy.route.clone(),
        },
        None => FeedRoute::Direct,
    };

    Ok(CoastalFeed::local(backend, fetcher)
        .with_route(route)
        .with_warmup_timeout(settings.warmup.timeout()))
}
