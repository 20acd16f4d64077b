use crate::audit::provenance::{ContentHash, LEDGER_DOMAIN};
use crate::core::account::AccountId;
use crate::core::currency::CurrencyCode;
use crate::core::period::DateRange;
use crate::core::record::RecordId;
use crate::ledger::discrepancy::Discrepancy;
use crate::ledger::LedgerError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an entry in a ledger: the day and the tie-break sequence
/// within that day. Unique per ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryRef {
    pub date: NaiveDate,
    pub sequence: u32,
}

impl EntryRef {
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self { date, sequence }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.date, self.sequence)
    }
}

/// Where an entry's `balance_after` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// The statement's printed balance, verified against the previous one.
    Stated,
    /// Previous balance plus this entry's amount.
    Computed,
}

/// One transaction in the canonical ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub sequence: u32,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub balance_source: BalanceSource,
    pub description: String,
    /// Records that describe this transaction. The first is the one whose
    /// data was used; the rest were merged into it as duplicates.
    pub sources: Vec<RecordId>,
}

impl LedgerEntry {
    pub fn entry_ref(&self) -> EntryRef {
        EntryRef::new(self.date, self.sequence)
    }

    /// The record whose data this entry carries.
    pub fn primary_source(&self) -> Option<RecordId> {
        self.sources.first().copied()
    }
}

/// The canonical, ordered transaction history of one account.
///
/// Produced by [`crate::ledger::builder::LedgerBuilder`] and never mutated
/// afterwards. Entries are strictly ordered by `(date, sequence)`. The
/// content hash covers everything a trace can observe, so two ledgers with
/// the same hash produce the same trace for the same claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ledger {
    account: AccountId,
    currency: CurrencyCode,
    opening_balance: Decimal,
    window: Option<DateRange>,
    entries: Vec<LedgerEntry>,
    discrepancies: Vec<Discrepancy>,
    content_hash: ContentHash,
}

#[derive(Serialize)]
struct LedgerContent<'a> {
    account: &'a AccountId,
    currency: &'a CurrencyCode,
    opening_balance: &'a Decimal,
    window: &'a Option<DateRange>,
    entries: &'a [LedgerEntry],
    discrepancies: &'a [Discrepancy],
}

impl Ledger {
    /// Assemble a ledger from already-ordered entries.
    ///
    /// Fails if any two entries are out of order or share a key. The
    /// content hash is always recomputed here.
    pub fn from_parts(
        account: AccountId,
        currency: CurrencyCode,
        opening_balance: Decimal,
        window: Option<DateRange>,
        entries: Vec<LedgerEntry>,
        discrepancies: Vec<Discrepancy>,
    ) -> Result<Self, LedgerError> {
        if let Some(pair) = entries
            .windows(2)
            .find(|w| w[0].entry_ref() >= w[1].entry_ref())
        {
            return Err(LedgerError::Unordered {
                previous: pair[0].entry_ref(),
                next: pair[1].entry_ref(),
            });
        }

        let content_hash = ContentHash::of(
            LEDGER_DOMAIN,
            &LedgerContent {
                account: &account,
                currency: &currency,
                opening_balance: &opening_balance,
                window: &window,
                entries: &entries,
                discrepancies: &discrepancies,
            },
        )?;

        Ok(Self {
            account,
            currency,
            opening_balance,
            window,
            entries,
            discrepancies,
            content_hash,
        })
    }

    // --- Accessors ---

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    /// The period the statements were required to cover.
    pub fn window(&self) -> Option<DateRange> {
        self.window
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.discrepancies
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    /// Entries dated on or after `date`.
    pub fn entries_from(&self, date: NaiveDate) -> &[LedgerEntry] {
        let start = self.entries.partition_point(|e| e.date < date);
        &self.entries[start..]
    }

    pub fn entry(&self, at: EntryRef) -> Option<&LedgerEntry> {
        self.entries
            .binary_search_by(|e| e.entry_ref().cmp(&at))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Balance after the last entry, or the opening balance if empty.
    pub fn closing_balance(&self) -> Decimal {
        self.entries
            .last()
            .map(|e| e.balance_after)
            .unwrap_or(self.opening_balance)
    }

    /// Coverage gaps that intersect `range`.
    pub fn gaps_within(&self, range: &DateRange) -> Vec<DateRange> {
        self.discrepancies
            .iter()
            .filter_map(|d| d.gap())
            .filter(|gap| gap.overlaps(range))
            .collect()
    }

    pub fn has_blocking_discrepancies(&self) -> bool {
        self.discrepancies.iter().any(|d| d.is_blocking())
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ledger {} ({}) ===", self.account, self.currency)?;
        if let Some(window) = self.window {
            writeln!(f, "Window:          {}", window)?;
        }
        writeln!(f, "Opening balance: {}", self.opening_balance)?;
        writeln!(f, "Entries:         {}", self.entries.len())?;
        writeln!(f, "Closing balance: {}", self.closing_balance())?;
        writeln!(f, "Content hash:    {}", self.content_hash)?;

        writeln!(f, "\n--- Entries ---")?;
        for e in &self.entries {
            let marker = match e.balance_source {
                BalanceSource::Stated => "S",
                BalanceSource::Computed => "C",
            };
            writeln!(
                f,
                "  {:<12} {:>15} {:>15} {} {}",
                e.entry_ref().to_string(),
                e.amount,
                e.balance_after,
                marker,
                e.description
            )?;
        }

        if !self.discrepancies.is_empty() {
            writeln!(f, "\n--- Discrepancies ---")?;
            for d in &self.discrepancies {
                writeln!(f, "  {}", d)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::BatchId;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn entry(day: u32, seq: u32, amount: Decimal, balance: Decimal) -> LedgerEntry {
        LedgerEntry {
            date: d(day),
            sequence: seq,
            amount,
            balance_after: balance,
            balance_source: BalanceSource::Computed,
            description: String::new(),
            sources: vec![RecordId::new(BatchId::from_u128(1), day * 10 + seq)],
        }
    }

    fn ledger(entries: Vec<LedgerEntry>) -> Result<Ledger, LedgerError> {
        Ledger::from_parts(
            AccountId::new("A"),
            CurrencyCode::new("USD"),
            dec!(100),
            None,
            entries,
            Vec::new(),
        )
    }

    #[test]
    fn test_rejects_unordered_entries() {
        let err = ledger(vec![
            entry(2, 0, dec!(1), dec!(101)),
            entry(1, 0, dec!(1), dec!(102)),
        ])
        .unwrap_err();
        assert!(matches!(err, LedgerError::Unordered { .. }));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = ledger(vec![
            entry(2, 0, dec!(1), dec!(101)),
            entry(2, 0, dec!(1), dec!(102)),
        ])
        .unwrap_err();
        assert!(matches!(err, LedgerError::Unordered { .. }));
    }

    #[test]
    fn test_entries_from_and_lookup() {
        let l = ledger(vec![
            entry(1, 0, dec!(-10), dec!(90)),
            entry(3, 0, dec!(-10), dec!(80)),
            entry(3, 1, dec!(5), dec!(85)),
        ])
        .unwrap();
        assert_eq!(l.entries_from(d(2)).len(), 2);
        assert_eq!(l.entries_from(d(3)).len(), 2);
        assert_eq!(l.entries_from(d(4)).len(), 0);
        assert_eq!(l.entry(EntryRef::new(d(3), 1)).unwrap().balance_after, dec!(85));
        assert!(l.entry(EntryRef::new(d(2), 0)).is_none());
        assert_eq!(l.closing_balance(), dec!(85));
    }

    #[test]
    fn test_hash_tracks_content() {
        let a = ledger(vec![entry(1, 0, dec!(-10), dec!(90))]).unwrap();
        let b = ledger(vec![entry(1, 0, dec!(-10), dec!(90))]).unwrap();
        let c = ledger(vec![entry(1, 0, dec!(-11), dec!(89))]).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_empty_ledger_closing_is_opening() {
        let l = ledger(Vec::new()).unwrap();
        assert!(l.is_empty());
        assert_eq!(l.closing_balance(), dec!(100));
        assert_eq!(l.first_date(), None);
    }
}
