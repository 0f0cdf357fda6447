//! UserBalance Server Binary
//!
//! Serves the balance HTTP API over a Postgres ledger.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userbalance_fx::{CurrencyConverter, HttpRateProvider, RateCache, RateCacheConfig};
use userbalance_ledger::PgLedgerStore;
use userbalance_server::{router, BalanceService, HealthState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting UserBalance server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    // Ledger store
    let store = PgLedgerStore::connect(config.database.clone()).await?;
    store.migrate().await?;

    let monitor = store.monitor();
    let monitor_handle = monitor.spawn();

    // Rates
    let provider = HttpRateProvider::new(config.rates.url.clone(), config.rates.request_timeout)?;
    let cache = Arc::new(RateCache::new(
        Arc::new(provider),
        RateCacheConfig {
            refresh_interval: config.rates.refresh_interval,
        },
    ));
    let converter = Arc::new(CurrencyConverter::new(
        cache,
        config.rates.base_currency.clone(),
    ));

    let service = Arc::new(BalanceService::new(Arc::new(store), converter));
    let app = router(
        service,
        HealthState {
            monitor: Some(monitor),
        },
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        listen_addr = %config.listen_addr,
        listen_port = %config.listen_port,
        base_currency = %config.rates.base_currency,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor_handle.abort();
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
