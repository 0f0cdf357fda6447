//! The ledger store capability.

use async_trait::async_trait;
use rust_decimal::Decimal;

use userbalance_common::{AccountId, Result};

use crate::balance::BalanceInfo;
use crate::journal::{HistoryOrder, TransactionRecord};

/// The only write path to balances and the only producer of history records.
///
/// Implementations must apply each mutation atomically: the non-negativity
/// check, the balance write and the history append are one unit, and
/// concurrent calls on overlapping accounts serialize so that every final
/// balance equals the sum of the committed deltas.
///
/// Unknown accounts read as a zero balance. Debiting one fails with
/// `InsufficientFunds`; crediting one creates it.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current balance of an account (zero if it has never been credited).
    async fn get_balance(&self, account_id: AccountId) -> Result<BalanceInfo>;

    /// Apply `balance += delta` and append one record. Returns the outcome
    /// message.
    async fn change_balance(&self, account_id: AccountId, delta: Decimal) -> Result<String>;

    /// Apply `from -= delta`, `to += delta` and append one record per
    /// account, all or nothing. Returns the shared outcome message.
    async fn transfer_between(
        &self,
        from: AccountId,
        to: AccountId,
        delta: Decimal,
    ) -> Result<String>;

    /// All records of an account in the requested order. An empty vector is
    /// a valid result.
    async fn get_history(
        &self,
        account_id: AccountId,
        order: HistoryOrder,
    ) -> Result<Vec<TransactionRecord>>;
}
