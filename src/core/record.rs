use crate::core::account::AccountId;
use crate::core::batch::{BatchId, Confidence};
use crate::core::currency::{CurrencyCode, Money};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a record: the batch that produced it and its
/// position within that batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    pub batch: BatchId,
    pub sequence: u32,
}

impl RecordId {
    pub fn new(batch: BatchId, sequence: u32) -> Self {
        Self { batch, sequence }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.batch, self.sequence)
    }
}

/// One transaction line as delivered by the statement normalizer.
///
/// `amount` is signed: deposits positive, withdrawals negative. A record
/// may carry the running balance printed on the statement; when present
/// it is treated as ground truth for that point of the ledger, subject to
/// reconciliation.
///
/// Records are immutable once ingested. Corrections arrive as new records
/// in a new batch and are resolved by deduplication.
///
/// # Examples
///
/// ```
/// use libr_trace::core::batch::BatchId;
/// use libr_trace::core::record::{RecordId, TransactionRecord};
/// use libr_trace::core::account::AccountId;
/// use libr_trace::core::currency::Money;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let record = TransactionRecord::new(
///     RecordId::new(BatchId::from_u128(1), 0),
///     AccountId::new("CHASE-CHK-4821"),
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     Money::new(dec!(-1200.00), "USD"),
/// )
/// .with_description("RENT MARCH")
/// .with_stated_balance(dec!(8800.00));
///
/// assert_eq!(record.amount().amount(), dec!(-1200.00));
/// assert_eq!(record.stated_balance().unwrap().amount(), dec!(8800.00));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: RecordId,
    account: AccountId,
    date: NaiveDate,
    amount: Money,
    stated_balance: Option<Money>,
    description: String,
    confidence: Confidence,
}

impl TransactionRecord {
    pub fn new(id: RecordId, account: AccountId, date: NaiveDate, amount: Money) -> Self {
        Self {
            id,
            account,
            date,
            amount,
            stated_balance: None,
            description: String::new(),
            confidence: Confidence::CERTAIN,
        }
    }

    /// Attach the running balance printed on the statement, in the
    /// record's own currency.
    pub fn with_stated_balance(mut self, balance: Decimal) -> Self {
        self.stated_balance = Some(Money::new(balance, self.amount.currency().clone()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn batch(&self) -> BatchId {
        self.id.batch
    }

    pub fn sequence(&self) -> u32 {
        self.id.sequence
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        self.amount.currency()
    }

    pub fn stated_balance(&self) -> Option<&Money> {
        self.stated_balance.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Whether two records say exactly the same thing, ignoring where
    /// they came from.
    pub fn same_content(&self, other: &TransactionRecord) -> bool {
        self.account == other.account
            && self.date == other.date
            && self.amount == other.amount
            && self.stated_balance == other.stated_balance
            && self.description == other.description
    }
}
