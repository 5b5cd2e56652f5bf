//! Serve command - run the same-origin proxy

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::resolve_backend;
use crate::config::Settings;
use crate::feed::CoastalFeed;
use crate::fetcher::{ReqwestTransport, ResilientFetcher};
use crate::proxy::{ProxyForwarder, ProxyServer};

/// Arguments for the serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (defaults to proxy.bind from settings)
    #[arg(long)]
    pub bind: Option<String>,

    /// Backend base URL (overrides settings and environment)
    #[arg(long)]
    pub backend: Option<String>,

    /// Skip the startup warm-up ping
    #[arg(long)]
    pub no_warmup: bool,
}

/// Execute the serve command
pub async fn execute(args: ServeArgs) -> Result<()> {
    let settings = Settings::load_or_default();

    let bind = args.bind.clone().unwrap_or_else(|| settings.proxy.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", bind))?;

    let backend = resolve_backend(&settings, args.backend.as_deref())?;
    let transport = Arc::new(ReqwestTransport::new()?);
    let proxy_policy = settings.proxy.policy();
    info!(
        "Proxy retry policy: {} attempts, {} ms base delay, {} ms timeout, retried statuses {:?}",
        proxy_policy.max_attempts,
        settings.proxy.retry.base_delay_ms,
        settings.proxy.retry.timeout_ms,
        settings.proxy.retry_statuses
    );
    let fetcher = ResilientFetcher::new(transport, proxy_policy);

    // Set up shutdown handling
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Handle Ctrl+C
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
        let _ = shutdown_tx_clone.send(());
    });

    if !args.no_warmup {
        let feed = CoastalFeed::local(Arc::clone(&backend), fetcher.clone())
            .with_warmup_timeout(settings.warmup.timeout());
        tokio::spawn(async move {
            feed.warm_up().await;
        });
    }

    let forwarder = ProxyForwarder::new(backend, fetcher);
    let server = ProxyServer::new(forwarder, settings.proxy.route.clone(), shutdown_tx);
    server.run(addr).await.context("Proxy server failed")?;

    info!("Proxy stopped");
    Ok(())
}
