//! UserBalance FX
//!
//! Display-time currency conversion for ledger balances. Balances are stored
//! in one base currency; this crate only projects them into others.
//!
//! # Features
//!
//! - Rate snapshots fetched from an external HTTP source
//! - Read-through snapshot cache refreshed on a fixed interval
//! - Pure conversion against a snapshot, failing closed on a base mismatch
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use userbalance_fx::{CurrencyConverter, HttpRateProvider, RateCache, RateCacheConfig};
//! use userbalance_common::Currency;
//!
//! let provider = HttpRateProvider::new(url, timeout)?;
//! let cache = Arc::new(RateCache::new(Arc::new(provider), RateCacheConfig::default()));
//! let converter = CurrencyConverter::new(cache, Currency::rub());
//!
//! let usd = converter.convert(balance, "USD").await?;
//! ```

pub mod snapshot;
pub mod provider;
pub mod cache;
pub mod conversion;
pub mod error;

pub use snapshot::RateSnapshot;
pub use provider::{HttpRateProvider, RateProvider};
pub use cache::{RateCache, RateCacheConfig, RateSource};
pub use conversion::{convert, CurrencyConverter};
pub use error::{FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
