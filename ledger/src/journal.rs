//! Transaction history records and ordering.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use userbalance_common::{AccountId, LedgerError, OperationId};

/// One committed balance change. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Insertion sequence number, assigned by the store.
    pub id: i64,
    /// Logical operation this record belongs to.
    pub operation_id: OperationId,
    /// Account affected.
    pub account_id: AccountId,
    /// Signed amount applied.
    pub delta: Decimal,
    /// Balance right after the delta was applied.
    pub resulting_balance: Decimal,
    /// Human-readable outcome message.
    pub message: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Column a history listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Sort by the signed delta.
    Amount,
    /// Sort by creation time.
    Time,
    /// Insertion order.
    #[default]
    Unsorted,
}

impl FromStr for SortKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(SortKey::Unsorted),
            "amount" | "sum" => Ok(SortKey::Amount),
            "time" | "date" => Ok(SortKey::Time),
            other => Err(LedgerError::WrongInput(format!(
                "unsupported sort key {other:?}, expected one of: amount, time"
            ))),
        }
    }
}

/// Requested ordering of a history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryOrder {
    pub key: SortKey,
    /// Ignored for `SortKey::Unsorted`.
    pub descending: bool,
}

impl HistoryOrder {
    pub fn new(key: SortKey, descending: bool) -> Self {
        Self { key, descending }
    }

    /// Parse an optional caller-supplied sort key.
    pub fn parse(sort_key: Option<&str>, descending: bool) -> Result<Self, LedgerError> {
        let key = match sort_key {
            Some(raw) => raw.parse()?,
            None => SortKey::Unsorted,
        };
        Ok(Self::new(key, descending))
    }

    /// Sort records in place. Ties are broken by insertion order.
    pub fn sort(&self, records: &mut [TransactionRecord]) {
        match self.key {
            SortKey::Unsorted => {
                records.sort_by_key(|r| r.id);
                return;
            }
            SortKey::Amount => records.sort_by(|a, b| a.delta.cmp(&b.delta).then(a.id.cmp(&b.id))),
            SortKey::Time => {
                records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            }
        }
        if self.descending {
            records.reverse();
        }
    }
}

/// Outcome message for a single-account change.
pub fn change_message(account_id: AccountId, delta: Decimal) -> String {
    if delta >= Decimal::ZERO {
        format!("Account {} credited with {:.2}", account_id, delta)
    } else {
        format!("Account {} debited by {:.2}", account_id, -delta)
    }
}

/// Outcome message shared by both records of a transfer. A negative delta
/// moves funds from `to` back to `from`.
pub fn transfer_message(from: AccountId, to: AccountId, delta: Decimal) -> String {
    if delta >= Decimal::ZERO {
        format!("Transferred {:.2} from account {} to account {}", delta, from, to)
    } else {
        format!("Transferred {:.2} from account {} to account {}", -delta, to, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn record(id: i64, delta: Decimal, minutes_ago: i64) -> TransactionRecord {
        TransactionRecord {
            id,
            operation_id: OperationId::new(),
            account_id: AccountId::new(1).unwrap(),
            delta,
            resulting_balance: Decimal::ZERO,
            message: String::new(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn ids(records: &[TransactionRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("".parse::<SortKey>().unwrap(), SortKey::Unsorted);
        assert_eq!("Amount".parse::<SortKey>().unwrap(), SortKey::Amount);
        assert_eq!("time".parse::<SortKey>().unwrap(), SortKey::Time);
        assert!(matches!(
            "balance".parse::<SortKey>(),
            Err(LedgerError::WrongInput(_))
        ));
    }

    #[test]
    fn test_sort_by_amount() {
        let mut records = vec![record(1, dec!(50), 3), record(2, dec!(-20), 2), record(3, dec!(10), 1)];

        HistoryOrder::new(SortKey::Amount, false).sort(&mut records);
        assert_eq!(ids(&records), vec![2, 3, 1]);

        HistoryOrder::new(SortKey::Amount, true).sort(&mut records);
        assert_eq!(ids(&records), vec![1, 3, 2]);
    }

    #[test]
    fn test_sort_by_time_descending() {
        let mut records = vec![record(1, dec!(1), 1), record(2, dec!(1), 30), record(3, dec!(1), 10)];

        HistoryOrder::new(SortKey::Time, true).sort(&mut records);
        assert_eq!(ids(&records), vec![1, 3, 2]);
        assert!(records.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn test_unsorted_keeps_insertion_order() {
        let mut records = vec![record(3, dec!(1), 0), record(1, dec!(5), 0), record(2, dec!(2), 0)];
        HistoryOrder::new(SortKey::Unsorted, true).sort(&mut records);
        assert_eq!(ids(&records), vec![1, 2, 3]);
    }

    #[test]
    fn test_messages() {
        let a = AccountId::new(1).unwrap();
        let b = AccountId::new(2).unwrap();

        assert_eq!(change_message(a, dec!(200)), "Account 1 credited with 200.00");
        assert_eq!(change_message(a, dec!(-200)), "Account 1 debited by 200.00");
        assert_eq!(
            transfer_message(a, b, dec!(40)),
            "Transferred 40.00 from account 1 to account 2"
        );
        assert_eq!(
            transfer_message(a, b, dec!(-40)),
            "Transferred 40.00 from account 2 to account 1"
        );
    }
}
