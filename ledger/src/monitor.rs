//! Background datastore connectivity monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::postgres::{open_pool, ping, DatabaseConfig};

/// Periodically pings the datastore and swaps in a fresh pool when the
/// current one stops answering.
///
/// Failures are logged, never returned: request handlers keep using whatever
/// pool is current and report their own errors.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    pool: Arc<RwLock<PgPool>>,
    config: DatabaseConfig,
    healthy: Arc<AtomicBool>,
}

impl ConnectionMonitor {
    /// Create a monitor over a shared pool slot.
    pub fn new(pool: Arc<RwLock<PgPool>>, config: DatabaseConfig) -> Self {
        Self {
            pool,
            config,
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Result of the most recent check.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Run a single check, reconnecting if needed. Returns the new health.
    pub async fn check_once(&self) -> bool {
        let current = self.pool.read().clone();

        let healthy = match ping(&current).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Ledger database not answering, reconnecting");
                self.reconnect().await
            }
        };

        let was_healthy = self.healthy.swap(healthy, Ordering::Relaxed);
        if healthy && !was_healthy {
            info!("Ledger database connection restored");
        }
        healthy
    }

    async fn reconnect(&self) -> bool {
        let fresh = match open_pool(&self.config).await {
            Ok(pool) => pool,
            Err(e) => {
                error!(error = %e, "Could not establish ledger database connection");
                return false;
            }
        };

        if let Err(e) = ping(&fresh).await {
            error!(error = %e, "New ledger database connection failed ping");
            return false;
        }

        let old = std::mem::replace(&mut *self.pool.write(), fresh);
        tokio::spawn(async move { old.close().await });
        true
    }

    /// Check forever at the configured interval.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the store was just verified.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.check_once().await;
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(&self) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(monitor.run())
    }
}
