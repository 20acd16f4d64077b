use crate::core::account::AccountId;
use crate::core::currency::{CurrencyCode, Money};
use crate::core::period::DateRange;
use crate::core::record::{RecordId, TransactionRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Identity of one ingested statement or import.
///
/// Assigned by the upload collaborator; the engine never generates these
/// on its own during a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Deterministic ids for tests and fixtures.
    pub fn from_u128(v: u128) -> Self {
        Self(Uuid::from_u128(v))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("extraction confidence must be within [0, 1], got {0}")]
pub struct ConfidenceError(pub Decimal);

/// Extraction confidence in `[0, 1]`.
///
/// A CSV export straight from the bank is `1`; an OCR pass over a scanned
/// statement is lower. Kept as a decimal so comparisons are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Confidence(Decimal);

impl Confidence {
    pub const CERTAIN: Confidence = Confidence(Decimal::ONE);

    pub fn new(value: Decimal) -> Result<Self, ConfidenceError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(ConfidenceError(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Confidence {
    type Error = ConfidenceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Confidence::new(value)
    }
}

impl From<Confidence> for Decimal {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One statement upload: a declared coverage period and the records
/// extracted from it.
///
/// # Examples
///
/// ```
/// use libr_trace::core::batch::{BatchId, StatementBatch};
/// use libr_trace::core::account::AccountId;
/// use libr_trace::core::period::DateRange;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let mut batch = StatementBatch::new(
///     BatchId::from_u128(1),
///     AccountId::new("CHASE-CHK-4821"),
///     "USD",
///     DateRange::new(d(1), d(31)).unwrap(),
/// );
/// batch.add(batch.record(d(3), dec!(-120.00)).with_description("UTILITIES"));
/// batch.add(batch.record(d(15), dec!(2500.00)).with_description("PAYROLL"));
///
/// assert_eq!(batch.len(), 2);
/// assert_eq!(batch.records()[1].sequence(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementBatch {
    id: BatchId,
    account: AccountId,
    currency: CurrencyCode,
    coverage: DateRange,
    confidence: Confidence,
    records: Vec<TransactionRecord>,
}

impl StatementBatch {
    pub fn new(
        id: BatchId,
        account: AccountId,
        currency: impl Into<CurrencyCode>,
        coverage: DateRange,
    ) -> Self {
        Self {
            id,
            account,
            currency: currency.into(),
            coverage,
            confidence: Confidence::CERTAIN,
            records: Vec::new(),
        }
    }

    /// Set the extraction confidence inherited by records created
    /// through [`StatementBatch::record`].
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Start a record for this batch with the next free sequence number.
    pub fn record(&self, date: NaiveDate, amount: Decimal) -> TransactionRecord {
        TransactionRecord::new(
            RecordId::new(self.id, self.next_sequence()),
            self.account.clone(),
            date,
            Money::new(amount, self.currency.clone()),
        )
        .with_confidence(self.confidence)
    }

    pub fn add(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    fn next_sequence(&self) -> u32 {
        self.records
            .iter()
            .map(|r| r.sequence() + 1)
            .max()
            .unwrap_or(0)
    }

    // --- Accessors ---

    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn coverage(&self) -> DateRange {
        self.coverage
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Net of all record amounts.
    pub fn net_total(&self) -> Decimal {
        self.records.iter().map(|r| r.amount().amount()).sum()
    }

    /// Same statement re-uploaded under a new batch identity.
    pub fn reissued(&self, id: BatchId) -> StatementBatch {
        let records = self
            .records
            .iter()
            .map(|r| {
                let mut copy = TransactionRecord::new(
                    RecordId::new(id, r.sequence()),
                    r.account().clone(),
                    r.date(),
                    r.amount().clone(),
                )
                .with_description(r.description())
                .with_confidence(r.confidence());
                if let Some(balance) = r.stated_balance() {
                    copy = copy.with_stated_balance(balance.amount());
                }
                copy
            })
            .collect();
        StatementBatch {
            id,
            records,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn batch() -> StatementBatch {
        StatementBatch::new(
            BatchId::from_u128(9),
            AccountId::new("A"),
            "USD",
            DateRange::new(d(1), d(31)).unwrap(),
        )
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(dec!(0)).is_ok());
        assert!(Confidence::new(dec!(1)).is_ok());
        assert!(Confidence::new(dec!(0.65)).is_ok());
        assert!(Confidence::new(dec!(1.01)).is_err());
        assert!(Confidence::new(dec!(-0.1)).is_err());
    }

    #[test]
    fn test_confidence_deserialize_validates() {
        assert!(serde_json::from_str::<Confidence>("\"0.9\"").is_ok());
        assert!(serde_json::from_str::<Confidence>("\"1.5\"").is_err());
    }

    #[test]
    fn test_records_get_sequential_ids() {
        let mut b = batch();
        b.add(b.record(d(2), dec!(10)));
        b.add(b.record(d(3), dec!(-4)));
        b.add(b.record(d(3), dec!(-1)));
        let seqs: Vec<u32> = b.records().iter().map(|r| r.sequence()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(b.net_total(), dec!(5));
    }

    #[test]
    fn test_records_inherit_batch_confidence() {
        let c = Confidence::new(dec!(0.7)).unwrap();
        let b = batch().with_confidence(c);
        assert_eq!(b.record(d(2), dec!(1)).confidence(), c);
    }

    #[test]
    fn test_reissued_keeps_content() {
        let mut b = batch();
        b.add(b.record(d(2), dec!(10)).with_stated_balance(dec!(110)));
        let again = b.reissued(BatchId::from_u128(10));
        assert_eq!(again.id(), BatchId::from_u128(10));
        assert_eq!(again.records()[0].batch(), BatchId::from_u128(10));
        assert!(again.records()[0].same_content(&b.records()[0]));
    }
}
