//! Read-through rate snapshot cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use userbalance_common::time::constants;

use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;
use crate::snapshot::RateSnapshot;

/// Anything that can hand out a current rate snapshot.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Current snapshot, refreshing it first if needed.
    async fn get_rates(&self) -> FxResult<Arc<RateSnapshot>>;
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a snapshot is served before it is refetched.
    pub refresh_interval: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: constants::rate_refresh_interval(),
        }
    }
}

/// Holds the latest snapshot and refreshes it lazily on read.
///
/// At most one refresh is in flight at a time. Readers that queued behind a
/// refresh reuse its outcome, including its error. A failed refresh leaves
/// the previous snapshot in place and is retried by the next read.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    current: RwLock<Option<Arc<RateSnapshot>>>,
    /// Error of the last completed refresh, if it failed.
    refresh: tokio::sync::Mutex<Option<FxError>>,
    /// Completed refresh attempts.
    attempts: AtomicU64,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create an empty cache in front of `provider`.
    pub fn new(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(None),
            attempts: AtomicU64::new(0),
            config,
        }
    }

    /// Latest snapshot if it is still within the refresh interval.
    fn fresh(&self) -> Option<Arc<RateSnapshot>> {
        self.current
            .read()
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh(self.config.refresh_interval))
            .cloned()
    }

    /// Whether a snapshot is held and still within the refresh interval.
    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }

    /// Most recent snapshot regardless of age.
    pub fn last_known(&self) -> Option<Arc<RateSnapshot>> {
        self.current.read().clone()
    }

    /// Force the next read to refetch. The stale snapshot stays available
    /// through [`RateCache::last_known`].
    pub fn invalidate(&self) {
        let mut current = self.current.write();
        if let Some(snapshot) = current.as_ref() {
            let mut expired = RateSnapshot::clone(snapshot);
            expired.fetched_at = chrono::DateTime::<chrono::Utc>::MIN_UTC;
            *current = Some(Arc::new(expired));
        }
    }

    /// Current snapshot, fetching a new one if the held one is missing or stale.
    pub async fn get_rates(&self) -> FxResult<Arc<RateSnapshot>> {
        if let Some(snapshot) = self.fresh() {
            debug!("Rate cache hit");
            return Ok(snapshot);
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut last_error = self.refresh.lock().await;

        // Another reader may have refreshed while this one waited.
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(e) = last_error.as_ref() {
                debug!(error = %e, "Reusing failed refresh outcome");
                return Err(e.clone());
            }
        }

        let outcome = self.provider.fetch_snapshot().await;
        self.attempts.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(snapshot) => {
                *last_error = None;
                let snapshot = Arc::new(snapshot);
                info!(
                    provider = self.provider.name(),
                    base = %snapshot.base,
                    currencies = snapshot.rates.len(),
                    "Rate snapshot refreshed"
                );
                *self.current.write() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    stale_available = self.current.read().is_some(),
                    "Rate refresh failed"
                );
                *last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}

#[async_trait]
impl RateSource for RateCache {
    async fn get_rates(&self) -> FxResult<Arc<RateSnapshot>> {
        RateCache::get_rates(self).await
    }
}
