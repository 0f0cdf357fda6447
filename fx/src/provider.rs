//! Rate provider traits and implementations.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use userbalance_common::Currency;

use crate::error::{FxError, FxResult};
use crate::snapshot::RateSnapshot;

/// Source of fresh rate snapshots.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch a complete snapshot.
    async fn fetch_snapshot(&self) -> FxResult<RateSnapshot>;
}

/// Body returned by the rates endpoint:
/// `{"base": "RUB", "date": "2020-05-01", "rates": {"USD": 0.0134, ...}}`.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    base: String,
    #[serde(default)]
    date: Option<String>,
    rates: HashMap<String, Decimal>,
}

impl RatesPayload {
    fn into_snapshot(self) -> FxResult<RateSnapshot> {
        let base = Currency::new(self.base);
        if base.is_empty() {
            return Err(FxError::ProviderError("payload has no base currency".to_string()));
        }

        let rates = self
            .rates
            .into_iter()
            .map(|(code, rate)| (Currency::new(code), rate))
            .filter(|(currency, _)| !currency.is_empty())
            .collect();

        Ok(RateSnapshot {
            base,
            date: self.date,
            fetched_at: Utc::now(),
            rates,
        })
    }
}

/// Fetches snapshots from an HTTP JSON endpoint.
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpRateProvider {
    /// Create a provider for `url`. Every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::ProviderError(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_snapshot(&self) -> FxResult<RateSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FxError::ProviderError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::ProviderError(format!(
                "rate source returned {status}"
            )));
        }

        let payload: RatesPayload = response
            .json()
            .await
            .map_err(|e| FxError::ProviderError(format!("malformed payload: {e}")))?;

        let snapshot = payload.into_snapshot()?;
        debug!(
            base = %snapshot.base,
            currencies = snapshot.rates.len(),
            "Fetched rate snapshot"
        );
        Ok(snapshot)
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    snapshot: parking_lot::Mutex<Option<RateSnapshot>>,
    fetches: std::sync::atomic::AtomicUsize,
    delay: Duration,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider serving the given factors against `base`.
    pub fn new(base: Currency, rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Self {
        let snapshot = RateSnapshot::new(base, rates.into_iter().collect());
        Self {
            snapshot: parking_lot::Mutex::new(Some(snapshot)),
            fetches: std::sync::atomic::AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Create a provider whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            snapshot: parking_lot::Mutex::new(None),
            fetches: std::sync::atomic::AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Delay every fetch by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make subsequent fetches fail.
    pub fn fail(&self) {
        *self.snapshot.lock() = None;
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        "MOCK"
    }

    async fn fetch_snapshot(&self) -> FxResult<RateSnapshot> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.snapshot.lock().clone() {
            Some(mut snapshot) => {
                snapshot.fetched_at = Utc::now();
                Ok(snapshot)
            }
            None => Err(FxError::ProviderError("mock provider unavailable".to_string())),
        }
    }
}
