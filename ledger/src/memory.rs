//! In-memory ledger store.
//!
//! Holds all balances and records behind one mutex, so every operation is
//! trivially atomic and serializable. Used by tests and by callers that need
//! a ledger without a live datastore.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use userbalance_common::{AccountId, LedgerError, OperationId, Result};

use crate::balance::BalanceInfo;
use crate::journal::{change_message, transfer_message, HistoryOrder, TransactionRecord};
use crate::store::LedgerStore;

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, Decimal>,
    records: Vec<TransactionRecord>,
    next_record_id: i64,
}

impl LedgerState {
    fn balance_of(&self, account_id: AccountId) -> BalanceInfo {
        match self.balances.get(&account_id) {
            Some(balance) => BalanceInfo {
                account_id,
                balance: *balance,
            },
            None => BalanceInfo::zero(account_id),
        }
    }

    /// Compute the new balance without mutating anything.
    fn check(&self, account_id: AccountId, delta: Decimal) -> Result<Decimal> {
        if delta < Decimal::ZERO && !self.balances.contains_key(&account_id) {
            return Err(LedgerError::InsufficientFunds { account_id, delta });
        }
        self.balance_of(account_id).apply(delta)
    }

    fn append(
        &mut self,
        operation_id: OperationId,
        account_id: AccountId,
        delta: Decimal,
        resulting_balance: Decimal,
        message: &str,
    ) {
        self.next_record_id += 1;
        self.records.push(TransactionRecord {
            id: self.next_record_id,
            operation_id,
            account_id,
            delta,
            resulting_balance,
            message: message.to_string(),
            created_at: Utc::now(),
        });
    }
}

/// Mutex-guarded in-memory implementation of [`LedgerStore`].
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all accounts.
    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_balance(&self, account_id: AccountId) -> Result<BalanceInfo> {
        Ok(self.state.lock().balance_of(account_id))
    }

    #[instrument(skip_all, fields(account_id = %account_id, delta = %delta))]
    async fn change_balance(&self, account_id: AccountId, delta: Decimal) -> Result<String> {
        let mut state = self.state.lock();

        let new_balance = state.check(account_id, delta)?;
        let message = change_message(account_id, delta);

        state.balances.insert(account_id, new_balance);
        state.append(OperationId::new(), account_id, delta, new_balance, &message);

        debug!(balance = %new_balance, "Balance changed");
        Ok(message)
    }

    #[instrument(skip_all, fields(from = %from, to = %to, delta = %delta))]
    async fn transfer_between(
        &self,
        from: AccountId,
        to: AccountId,
        delta: Decimal,
    ) -> Result<String> {
        if from == to {
            return Err(LedgerError::WrongInput(
                "cannot transfer between the same account".to_string(),
            ));
        }

        let mut state = self.state.lock();

        // Both legs are checked before either is written.
        let from_balance = state.check(from, -delta)?;
        let to_balance = state.check(to, delta)?;
        let message = transfer_message(from, to, delta);
        let operation_id = OperationId::new();

        state.balances.insert(from, from_balance);
        state.balances.insert(to, to_balance);
        state.append(operation_id, from, -delta, from_balance, &message);
        state.append(operation_id, to, delta, to_balance, &message);

        debug!(from_balance = %from_balance, to_balance = %to_balance, "Transfer applied");
        Ok(message)
    }

    async fn get_history(
        &self,
        account_id: AccountId,
        order: HistoryOrder,
    ) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self
            .state
            .lock()
            .records
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        order.sort(&mut records);
        Ok(records)
    }
}
