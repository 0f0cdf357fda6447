//! Balance service facade.
//!
//! Validates caller input, delegates to the ledger store and projects
//! balances into a requested currency. Holds no state of its own.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use userbalance_common::{AccountId, Currency, LedgerError, Result};
use userbalance_fx::CurrencyConverter;
use userbalance_ledger::{HistoryOrder, LedgerStore, TransactionRecord};

/// Balance of one account expressed in some currency.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub id: AccountId,
    pub balance: Decimal,
    pub currency: Currency,
}

/// Entry point for every balance operation.
pub struct BalanceService {
    store: Arc<dyn LedgerStore>,
    converter: Arc<CurrencyConverter>,
}

impl BalanceService {
    pub fn new(store: Arc<dyn LedgerStore>, converter: Arc<CurrencyConverter>) -> Self {
        Self { store, converter }
    }

    /// Currency balances are stored in.
    pub fn base_currency(&self) -> &Currency {
        self.converter.base()
    }

    /// Balance of `id`, converted into `currency` when one is given.
    ///
    /// Conversion is best effort: if it fails for any reason the balance is
    /// returned in the base currency.
    #[instrument(skip_all, fields(account_id = %id))]
    pub async fn get_balance_display(
        &self,
        id: AccountId,
        currency: Option<&str>,
    ) -> Result<BalanceView> {
        let info = self.store.get_balance(id).await?;
        let base = BalanceView {
            id,
            balance: info.balance,
            currency: self.base_currency().clone(),
        };

        let target = match currency.map(Currency::new) {
            Some(target) if !target.is_empty() && target != base.currency => target,
            _ => return Ok(base),
        };

        match self.converter.convert(info.balance, target.code()).await {
            Ok(money) => Ok(BalanceView {
                id,
                balance: money.value,
                currency: money.currency,
            }),
            Err(e) => {
                warn!(
                    currency = %target,
                    error = %e,
                    "Conversion failed, returning base currency"
                );
                Ok(base)
            }
        }
    }

    /// Apply a non-zero `delta` to `id`.
    #[instrument(skip_all, fields(account_id = %id, delta = %delta))]
    pub async fn change_balance(&self, id: AccountId, delta: Decimal) -> Result<String> {
        if delta.is_zero() {
            return Err(LedgerError::WrongInput("delta must be non-zero".to_string()));
        }

        self.store.change_balance(id, delta).await
    }

    /// Move a non-zero `delta` from `from` to `to`.
    #[instrument(skip_all, fields(from = %from, to = %to, delta = %delta))]
    pub async fn transfer(&self, from: AccountId, to: AccountId, delta: Decimal) -> Result<String> {
        if from == to {
            return Err(LedgerError::WrongInput(
                "cannot transfer between an account and itself".to_string(),
            ));
        }

        if delta.is_zero() {
            return Err(LedgerError::WrongInput("delta must be non-zero".to_string()));
        }

        self.store.transfer_between(from, to, delta).await
    }

    /// Transaction history of `id`. `sort_by` is `amount`, `time` or absent.
    #[instrument(skip_all, fields(account_id = %id))]
    pub async fn history(
        &self,
        id: AccountId,
        sort_by: Option<&str>,
        descending: bool,
    ) -> Result<Vec<TransactionRecord>> {
        let order = HistoryOrder::parse(sort_by, descending)?;
        self.store.get_history(id, order).await
    }
}
