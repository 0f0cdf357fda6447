//! UserBalance Server
//!
//! HTTP balance service: reads balances (optionally converted into another
//! currency), applies credits and debits, transfers between accounts and
//! lists transaction history.

pub mod config;
pub mod service;
pub mod http;

pub use config::{RatesConfig, ServerConfig};
pub use service::{BalanceService, BalanceView};
pub use http::{router, HealthState};
