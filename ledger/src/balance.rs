//! Account balance tracking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use userbalance_common::{AccountId, LedgerError, Result};

/// Current balance of one account, in the ledger's base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Account identifier.
    pub account_id: AccountId,
    /// Balance. Never negative for a committed state.
    pub balance: Decimal,
}

impl BalanceInfo {
    /// Balance of an account that has no row yet.
    pub fn zero(account_id: AccountId) -> Self {
        Self {
            account_id,
            balance: Decimal::ZERO,
        }
    }

    /// Balance after applying a signed delta, rejecting results below zero
    /// and results outside the representable range.
    pub fn apply(&self, delta: Decimal) -> Result<Decimal> {
        let new_balance = self.balance.checked_add(delta).ok_or_else(|| {
            LedgerError::WrongInput(format!(
                "applying {delta} to account {} exceeds the supported balance range",
                self.account_id
            ))
        })?;
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.account_id,
                delta,
            });
        }
        Ok(new_balance)
    }
}
