//! Error types for ledger operations.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::AccountId;

/// Main error type for ledger operations.
///
/// `Internal` carries diagnostic detail for logs only; transports must show
/// callers an opaque message instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Malformed caller input.
    #[error("Wrong input: {0}")]
    WrongInput(String),

    /// Applying the delta would leave the account negative.
    #[error("Insufficient funds on account {account_id} to apply {delta}")]
    InsufficientFunds { account_id: AccountId, delta: Decimal },

    /// Datastore or unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Whether the caller caused the error (as opposed to the system).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, LedgerError::Internal(_))
    }

    /// Get error code for transport responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::WrongInput(_) => "WRONG_INPUT",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
