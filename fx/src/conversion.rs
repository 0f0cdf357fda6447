//! Currency conversion against a rate snapshot.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use userbalance_common::{Currency, Money};

use crate::cache::RateSource;
use crate::error::{FxError, FxResult};
use crate::snapshot::RateSnapshot;

/// Convert a base-currency `amount` into `target` using `snapshot`.
///
/// The snapshot must be quoted against `ledger_base`; a snapshot quoted
/// against anything else is refused rather than misapplied. The result is
/// rounded to the target currency's minor units.
pub fn convert(
    amount: Decimal,
    target: &Currency,
    ledger_base: &Currency,
    snapshot: &RateSnapshot,
) -> FxResult<Money> {
    if target.is_empty() {
        return Err(FxError::EmptyCurrency);
    }

    if snapshot.base != *ledger_base {
        return Err(FxError::BaseMismatch {
            expected: ledger_base.clone(),
            actual: snapshot.base.clone(),
        });
    }

    let rate = snapshot
        .rate_for(target)
        .ok_or_else(|| FxError::RateNotAvailable(target.clone()))?;

    let value = amount.checked_mul(rate).ok_or_else(|| FxError::Overflow {
        amount,
        currency: target.clone(),
    })?;

    Ok(Money::new(value, target.clone()).round())
}

/// Converts ledger amounts using whatever snapshot `source` currently holds.
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    base: Currency,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>, base: Currency) -> Self {
        Self { source, base }
    }

    /// Currency the ledger stores balances in.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// Convert `amount` into the currency named by `target`.
    #[instrument(skip(self))]
    pub async fn convert(&self, amount: Decimal, target: &str) -> FxResult<Money> {
        let target = Currency::new(target);
        if target.is_empty() {
            return Err(FxError::EmptyCurrency);
        }

        let snapshot = self.source.get_rates().await?;
        convert(amount, &target, &self.base, &snapshot)
    }
}
