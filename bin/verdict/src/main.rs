use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, MarketFeed};
use feed::{Poller, PollerCommand, VerdictClient};
use strategy::{DataSourceRegistry, StrategyValidator};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    info!(network = %cfg.network, api = %cfg.api_base_url, "Verdict monitor starting");
    if !cfg.network.is_ready() {
        warn!(network = %cfg.network.slug, "No router contract deployed on this network");
    }

    // ── Data source registry ──────────────────────────────────────────────────
    // A fallback id missing from the table is a deploy mistake: refuse to start.
    let registry = match &cfg.data_sources_path {
        Some(path) => DataSourceRegistry::load(path),
        None => DataSourceRegistry::bundled(),
    }
    .unwrap_or_else(|e| panic!("Data source registry is inconsistent: {e}"));
    let registry = Arc::new(registry);
    info!(
        sources = registry.len(),
        fallbacks = registry.fallbacks().count(),
        "Data source registry ready"
    );

    // ── Backend client & poller ───────────────────────────────────────────────
    let client = VerdictClient::new(&cfg.api_base_url, cfg.http_timeout)
        .unwrap_or_else(|e| panic!("Failed to build API client: {e}"));
    let admin = cfg.admin_controls.then(|| client.clone());
    let feed: Arc<dyn MarketFeed> = Arc::new(client);
    let validator = Arc::new(StrategyValidator::new(registry.clone()));
    let (poller, poller_handle) = Poller::new(feed, validator, cfg.poll_interval);

    // ── Dashboard API ─────────────────────────────────────────────────────────
    let api_state = api::AppState {
        poller: poller_handle.clone(),
        registry,
        network: cfg.network,
        admin,
    };
    if api_state.admin.is_some() {
        info!("Admin round controls enabled on the dashboard API");
    }

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let poller_task = tokio::spawn(poller.run());
    let port = cfg.dashboard_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            warn!(error = %e, "Dashboard API exited");
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received. Stopping poller.");
    poller_handle.send(PollerCommand::Stop).await;
    let _ = poller_task.await;
}
