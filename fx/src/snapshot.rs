//! Rate snapshots.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use userbalance_common::Currency;

/// An immutable set of conversion factors fetched in one go.
///
/// Each factor is the amount of the target currency per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Currency every factor is quoted against.
    pub base: Currency,
    /// Publication date reported by the source, if any.
    pub date: Option<String>,
    /// When the snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Target currency to factor.
    pub rates: HashMap<Currency, Decimal>,
}

impl RateSnapshot {
    /// Create a snapshot fetched now.
    pub fn new(base: Currency, rates: HashMap<Currency, Decimal>) -> Self {
        Self {
            base,
            date: None,
            fetched_at: Utc::now(),
            rates,
        }
    }

    /// Factor for a target currency.
    pub fn rate_for(&self, currency: &Currency) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    /// Time since the snapshot was fetched. Clock skew reads as zero.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot is younger than `max_age`.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() < max_age
    }
}
