mod adapters;
mod application;
mod collectors;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{ArmClient, SnapshotStore, TcpProber};
use application::{Orchestrator, PortScanner, PublicIpBridge, ResultAggregator, ScanSettings};
use config::Config;
use domain::Subscription;
use interface::http::create_router;
use ports::ResourceApi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration; invalid port ranges abort before any scheduling
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("azrm_exporter={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting azrm-exporter v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let api: Arc<dyn ResourceApi> = Arc::new(ArmClient::from_env()?);
    let subscriptions = resolve_subscriptions(api.as_ref(), &config.subscriptions).await?;
    info!("✓ Collecting {} subscription(s)", subscriptions.len());

    let store = Arc::new(SnapshotStore::new());

    let bridge = if config.portscan {
        info!(
            "✓ Portscanner enabled: interval {:?}, {} parallel x {} threads, ranges {:?}",
            config.portscan_interval,
            config.portscan_parallel,
            config.portscan_threads,
            config
                .portscan_ranges
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>(),
        );
        let scanner = PortScanner::new(
            ScanSettings {
                interval: config.portscan_interval,
                parallel: config.portscan_parallel,
                threads: config.portscan_threads,
                timeout: config.portscan_timeout,
                ranges: config.portscan_ranges.clone(),
            },
            Arc::new(TcpProber),
            Arc::clone(&store),
        );
        Some(PublicIpBridge::new(scanner.spawn()))
    } else {
        None
    };

    let orchestrator = Orchestrator::new(
        config.scrape_interval,
        subscriptions,
        config.locations.clone(),
        collectors::default_collectors(Arc::clone(&api)),
        ResultAggregator::new(Arc::clone(&store)),
        bridge,
    );

    info!("✓ Starting metrics collection, scrape interval {:?}", config.scrape_interval);
    tokio::spawn(async move {
        // only fatal task errors escape the run loop
        if let Err(e) = orchestrator.run().await {
            error!("Metrics collection aborted: {e}");
            std::process::exit(1);
        }
    });

    let app = create_router(store);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("✓ Listening on {}", config.bind);
    info!("  → Metrics: http://{}/metrics", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Fixed subscription list from configuration, or auto-discovery when empty.
/// Any failure here is fatal: no cycle can run without working credentials.
async fn resolve_subscriptions(
    api: &dyn ResourceApi,
    configured: &[String],
) -> Result<Vec<Subscription>, ports::ApiError> {
    if configured.is_empty() {
        return api.list_subscriptions().await;
    }

    let mut subscriptions = Vec::with_capacity(configured.len());
    for id in configured {
        subscriptions.push(api.get_subscription(id).await?);
    }
    Ok(subscriptions)
}
