//! FX error types.

use rust_decimal::Decimal;
use thiserror::Error;
use userbalance_common::Currency;

/// Errors that can occur while fetching rates or converting.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// No target currency was given.
    #[error("Target currency is empty")]
    EmptyCurrency,

    /// The snapshot is quoted against a different base than the ledger.
    #[error("Rate base mismatch: expected {expected}, got {actual}")]
    BaseMismatch { expected: Currency, actual: Currency },

    /// The snapshot has no rate for the requested currency.
    #[error("Rate not available for {0}")]
    RateNotAvailable(Currency),

    /// The converted amount does not fit the decimal range.
    #[error("Converting {amount} into {currency} overflows")]
    Overflow { amount: Decimal, currency: Currency },

    /// Fetching a fresh snapshot failed (transport, status or payload).
    #[error("Rate provider error: {0}")]
    ProviderError(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
