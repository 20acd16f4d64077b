use crate::core::batch::BatchId;
use crate::core::period::DateRange;
use crate::core::record::RecordId;
use crate::ledger::entry::EntryRef;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much a discrepancy should hold up reliance on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Recorded and reported; the computation stands.
    Warning,
    /// Needs a human decision before the result is relied on. The
    /// computation still completes.
    Blocking,
}

/// What went wrong, with the data needed to resolve it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Records from different batches look like the same transaction,
    /// carry the same confidence, but do not agree on every field.
    DuplicateConflict {
        amount: Decimal,
        kept: RecordId,
        conflicting: Vec<RecordId>,
    },
    /// A stated running balance disagrees with the previous stated
    /// balance plus the intervening amounts.
    BalanceMismatch {
        record: RecordId,
        amount: Decimal,
        stated: Decimal,
        expected: Decimal,
    },
    /// No statement declares coverage for this interval.
    CoverageGap { gap: DateRange },
}

/// A flagged inconsistency in the ledger, carried into every trace
/// computed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub date: NaiveDate,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiscrepancyKind,
    /// Ledger entries affected; empty for coverage gaps.
    pub entries: Vec<EntryRef>,
}

impl Discrepancy {
    pub fn duplicate_conflict(
        date: NaiveDate,
        amount: Decimal,
        kept: RecordId,
        conflicting: Vec<RecordId>,
        entry: EntryRef,
    ) -> Self {
        Self {
            date,
            severity: Severity::Blocking,
            kind: DiscrepancyKind::DuplicateConflict {
                amount,
                kept,
                conflicting,
            },
            entries: vec![entry],
        }
    }

    pub fn balance_mismatch(
        record: RecordId,
        amount: Decimal,
        stated: Decimal,
        expected: Decimal,
        entry: EntryRef,
    ) -> Self {
        Self {
            date: entry.date,
            severity: Severity::Warning,
            kind: DiscrepancyKind::BalanceMismatch {
                record,
                amount,
                stated,
                expected,
            },
            entries: vec![entry],
        }
    }

    pub fn coverage_gap(gap: DateRange) -> Self {
        Self {
            date: gap.start(),
            severity: Severity::Warning,
            kind: DiscrepancyKind::CoverageGap { gap },
            entries: Vec::new(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }

    /// The uncovered interval, if this is a coverage gap.
    pub fn gap(&self) -> Option<DateRange> {
        match &self.kind {
            DiscrepancyKind::CoverageGap { gap } => Some(*gap),
            _ => None,
        }
    }

    /// Batches whose records are involved.
    pub fn batches(&self) -> Vec<BatchId> {
        let mut batches: Vec<BatchId> = match &self.kind {
            DiscrepancyKind::DuplicateConflict {
                kept, conflicting, ..
            } => std::iter::once(kept)
                .chain(conflicting.iter())
                .map(|r| r.batch)
                .collect(),
            DiscrepancyKind::BalanceMismatch { record, .. } => vec![record.batch],
            DiscrepancyKind::CoverageGap { .. } => Vec::new(),
        };
        batches.sort();
        batches.dedup();
        batches
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            DiscrepancyKind::DuplicateConflict { .. } => "DuplicateConflict",
            DiscrepancyKind::BalanceMismatch { .. } => "BalanceMismatch",
            DiscrepancyKind::CoverageGap { .. } => "CoverageGap",
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Blocking => "blocking",
        };
        write!(f, "[{}] {} on {}: ", severity, self.label(), self.date)?;
        match &self.kind {
            DiscrepancyKind::DuplicateConflict {
                amount,
                kept,
                conflicting,
            } => {
                let others: Vec<String> = conflicting.iter().map(|r| r.to_string()).collect();
                write!(
                    f,
                    "amount {} kept {} over equally confident {}",
                    amount,
                    kept,
                    others.join(", ")
                )
            }
            DiscrepancyKind::BalanceMismatch {
                record,
                amount,
                stated,
                expected,
            } => write!(
                f,
                "record {} (amount {}) states balance {} but prior statement implies {} (off by {})",
                record,
                amount,
                stated,
                expected,
                stated - expected
            ),
            DiscrepancyKind::CoverageGap { gap } => {
                write!(f, "no statement covers {} ({} days)", gap, gap.days())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_severities() {
        let gap = Discrepancy::coverage_gap(DateRange::new(d(3), d(9)).unwrap());
        assert!(!gap.is_blocking());
        assert_eq!(gap.date, d(3));
        assert_eq!(gap.gap().unwrap().days(), 7);

        let conflict = Discrepancy::duplicate_conflict(
            d(4),
            dec!(-20),
            RecordId::new(BatchId::from_u128(1), 0),
            vec![RecordId::new(BatchId::from_u128(2), 3)],
            EntryRef::new(d(4), 0),
        );
        assert!(conflict.is_blocking());
        assert!(conflict.gap().is_none());
        assert_eq!(conflict.batches().len(), 2);
    }

    #[test]
    fn test_display_gives_resolution_context() {
        let mismatch = Discrepancy::balance_mismatch(
            RecordId::new(BatchId::from_u128(1), 4),
            dec!(-100),
            dec!(900),
            dec!(950),
            EntryRef::new(d(10), 2),
        );
        let text = mismatch.to_string();
        assert!(text.contains("BalanceMismatch"));
        assert!(text.contains("2024-05-10"));
        assert!(text.contains("900"));
        assert!(text.contains("off by -50"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let gap = Discrepancy::coverage_gap(DateRange::single(d(1)));
        let json = serde_json::to_value(&gap).unwrap();
        assert_eq!(json["kind"], "coverage_gap");
        assert_eq!(json["severity"], "warning");
    }
}
