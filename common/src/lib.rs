//! UserBalance Common Types
//!
//! Shared types used across the balance ledger crates: account and operation
//! identifiers, currency and money types, the error taxonomy and timing
//! constants.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
