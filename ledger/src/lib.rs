//! UserBalance Ledger
//!
//! Per-account balances with an append-only transaction history. Every
//! mutation runs as one datastore transaction: the guarded balance update and
//! the history records commit together or not at all.

pub mod balance;
pub mod journal;
pub mod store;
pub mod memory;
pub mod postgres;
pub mod monitor;

pub use balance::BalanceInfo;
pub use journal::{HistoryOrder, SortKey, TransactionRecord};
pub use store::LedgerStore;
pub use memory::InMemoryLedgerStore;
pub use postgres::{DatabaseConfig, PgLedgerStore};
pub use monitor::ConnectionMonitor;
