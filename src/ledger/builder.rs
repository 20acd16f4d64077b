use crate::config::TraceConfig;
use crate::core::account::AccountId;
use crate::core::batch::{BatchId, StatementBatch};
use crate::core::currency::CurrencyCode;
use crate::core::period::DateRange;
use crate::core::record::{RecordId, TransactionRecord};
use crate::ledger::coverage::{find_gaps, hull};
use crate::ledger::dedup::{resolve_duplicates, Resolved};
use crate::ledger::discrepancy::Discrepancy;
use crate::ledger::entry::{BalanceSource, EntryRef, Ledger, LedgerEntry};
use crate::ledger::ordering::{order_day, settles, OrderBasis};
use crate::ledger::LedgerError;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Builds the canonical ledger for one account from its statement
/// batches.
///
/// # Pipeline
///
/// 1. Validate that every batch and record belongs to this account and
///    currency, and that no batch or record id repeats.
/// 2. Collapse cross-batch duplicates (see [`crate::ledger::dedup`]).
/// 3. Establish the opening balance.
/// 4. Order each day's entries (see [`crate::ledger::ordering`]).
/// 5. Replay amounts, reconciling against stated balances.
/// 6. Report uncovered parts of the analysis window.
///
/// Building is a pure function of the batches and the configuration.
///
/// # Examples
///
/// ```
/// use libr_trace::core::account::AccountId;
/// use libr_trace::core::batch::{BatchId, StatementBatch};
/// use libr_trace::core::period::DateRange;
/// use libr_trace::ledger::builder::LedgerBuilder;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let account = AccountId::new("CHASE-CHK-4821");
/// let mut jan = StatementBatch::new(
///     BatchId::from_u128(1),
///     account.clone(),
///     "USD",
///     DateRange::new(d(1), d(31)).unwrap(),
/// );
/// jan.add(jan.record(d(2), dec!(-200)).with_stated_balance(dec!(9800)));
/// jan.add(jan.record(d(9), dec!(-1800)).with_stated_balance(dec!(8000)));
///
/// let mut builder = LedgerBuilder::new(account, "USD");
/// builder.add_batch(jan);
/// let ledger = builder.build().unwrap();
///
/// assert_eq!(ledger.opening_balance(), dec!(10000));
/// assert_eq!(ledger.closing_balance(), dec!(8000));
/// assert!(ledger.discrepancies().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LedgerBuilder {
    account: AccountId,
    currency: CurrencyCode,
    config: TraceConfig,
    batches: Vec<StatementBatch>,
}

impl LedgerBuilder {
    pub fn new(account: AccountId, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            account,
            currency: currency.into(),
            config: TraceConfig::default(),
            batches: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Fix the balance before the first entry instead of deriving it.
    pub fn with_opening_balance(mut self, balance: Decimal) -> Self {
        self.config.opening_balance = Some(balance);
        self
    }

    pub fn with_analysis_window(mut self, window: DateRange) -> Self {
        self.config.analysis_window = Some(window);
        self
    }

    pub fn add_batch(&mut self, batch: StatementBatch) -> &mut Self {
        self.batches.push(batch);
        self
    }

    pub fn add_batches(&mut self, batches: impl IntoIterator<Item = StatementBatch>) -> &mut Self {
        self.batches.extend(batches);
        self
    }

    // --- Accessors ---

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn batches(&self) -> &[StatementBatch] {
        &self.batches
    }

    /// Run the pipeline.
    ///
    /// Inconsistencies in otherwise valid input become discrepancies on
    /// the ledger. Only input that cannot belong to this ledger at all is
    /// an error.
    pub fn build(&self) -> Result<Ledger, LedgerError> {
        self.config.validate()?;
        self.validate_input()?;

        let coverage: HashMap<BatchId, DateRange> = self
            .batches
            .iter()
            .map(|b| (b.id(), b.coverage()))
            .collect();

        let mut records: Vec<&TransactionRecord> =
            self.batches.iter().flat_map(|b| b.records()).collect();
        records.sort_by_key(|r| (r.date(), r.id()));

        let resolved = resolve_duplicates(&records, &coverage, self.config.similarity_threshold);
        let merged: usize = resolved.iter().map(|r| r.merged.len()).sum();

        let opening_balance = match self.config.opening_balance {
            Some(balance) => balance,
            None => derive_opening_balance(&resolved, self.config.balance_tolerance),
        };

        let mut replay = Replay::new(opening_balance, self.config.balance_tolerance);
        for day in group_by_day(resolved) {
            let date = day[0].kept.date();
            let count = day.len();
            let (ordered, basis) = order_day(
                day,
                replay.balance,
                self.config.balance_tolerance,
                self.config.same_day_policy,
            );
            if basis != OrderBasis::Single {
                debug!("{}: {} entries ordered by {:?}", date, count, basis);
            }
            for (sequence, resolved) in ordered.iter().enumerate() {
                replay.apply(resolved, sequence as u32);
            }
        }

        let window = self
            .config
            .analysis_window
            .or_else(|| hull(&coverage.values().copied().collect::<Vec<_>>()));
        let mut gaps = Vec::new();
        if let Some(window) = window {
            let mut declared: Vec<DateRange> = coverage.values().copied().collect();
            declared.sort();
            gaps = find_gaps(window, &declared);
        }
        for gap in &gaps {
            warn!(
                "account {}: no statement covers {} ({} days)",
                self.account,
                gap,
                gap.days()
            );
        }

        let Replay {
            entries,
            mut discrepancies,
            conflicts,
            mismatches,
            ..
        } = replay;
        discrepancies.extend(gaps.iter().copied().map(Discrepancy::coverage_gap));
        discrepancies.sort_by_key(|d| d.date);

        info!(
            "ledger {}: {} records from {} batches -> {} entries ({} duplicates merged, {} conflicts, {} balance mismatches, {} coverage gaps)",
            self.account,
            records.len(),
            self.batches.len(),
            entries.len(),
            merged,
            conflicts,
            mismatches,
            gaps.len()
        );

        Ledger::from_parts(
            self.account.clone(),
            self.currency.clone(),
            opening_balance,
            window,
            entries,
            discrepancies,
        )
    }

    fn validate_input(&self) -> Result<(), LedgerError> {
        let mut batch_ids: HashSet<BatchId> = HashSet::new();
        let mut record_ids: HashSet<RecordId> = HashSet::new();

        for batch in &self.batches {
            if !batch_ids.insert(batch.id()) {
                return Err(LedgerError::DuplicateBatch { batch: batch.id() });
            }
            if batch.account() != &self.account {
                return Err(LedgerError::BatchAccount {
                    batch: batch.id(),
                    expected: self.account.clone(),
                    found: batch.account().clone(),
                });
            }
            if batch.currency() != &self.currency {
                return Err(LedgerError::BatchCurrency {
                    batch: batch.id(),
                    expected: self.currency.clone(),
                    found: batch.currency().clone(),
                });
            }

            for record in batch.records() {
                if record.batch() != batch.id() {
                    return Err(LedgerError::RecordBatch {
                        record: record.id(),
                        claimed: record.batch(),
                        batch: batch.id(),
                    });
                }
                if record.account() != &self.account {
                    return Err(LedgerError::RecordAccount {
                        record: record.id(),
                        expected: self.account.clone(),
                        found: record.account().clone(),
                    });
                }
                let stated_currency = record.stated_balance().map(|m| m.currency());
                for found in std::iter::once(record.currency()).chain(stated_currency) {
                    if found != &self.currency {
                        return Err(LedgerError::Currency {
                            record: record.id(),
                            expected: self.currency.clone(),
                            found: found.clone(),
                        });
                    }
                }
                if !record_ids.insert(record.id()) {
                    return Err(LedgerError::DuplicateRecord {
                        record: record.id(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Split records sorted by `(date, id)` into per-day groups.
fn group_by_day(resolved: Vec<Resolved<'_>>) -> Vec<Vec<Resolved<'_>>> {
    let mut days: Vec<Vec<Resolved<'_>>> = Vec::new();
    for r in resolved {
        match days.last_mut() {
            Some(day) if day[0].kept.date() == r.kept.date() => day.push(r),
            _ => days.push(vec![r]),
        }
    }
    days
}

/// Work back from the first day that states a balance. Zero when no
/// record states one.
///
/// When every record of that day states a balance, the statement may list
/// them out of order, so the prior balance is the candidate
/// `stated - amount` from which the day's chain settles. Otherwise the
/// first stated record in statement order decides.
fn derive_opening_balance(resolved: &[Resolved<'_>], tolerance: Decimal) -> Decimal {
    let mut net = Decimal::ZERO;
    let mut start = 0;
    while start < resolved.len() {
        let date = resolved[start].kept.date();
        let end = resolved[start..]
            .iter()
            .position(|r| r.kept.date() != date)
            .map_or(resolved.len(), |n| start + n);
        let day = &resolved[start..end];

        if day.iter().any(|r| r.kept.stated_balance().is_some()) {
            if day.iter().all(|r| r.kept.stated_balance().is_some()) {
                let settled = day
                    .iter()
                    .filter_map(|r| {
                        r.kept
                            .stated_balance()
                            .map(|s| s.amount() - r.kept.amount().amount())
                    })
                    .find(|&prior| settles(day, prior, tolerance));
                if let Some(prior) = settled {
                    return prior - net;
                }
            }

            let mut day_net = net;
            for r in day {
                day_net += r.kept.amount().amount();
                if let Some(stated) = r.kept.stated_balance() {
                    return stated.amount() - day_net;
                }
            }
        }

        net += day.iter().map(|r| r.kept.amount().amount()).sum::<Decimal>();
        start = end;
    }
    Decimal::ZERO
}

/// Running state of the balance replay.
struct Replay {
    tolerance: Decimal,
    balance: Decimal,
    /// Last stated (or opening) balance and the net of amounts since.
    anchor: Decimal,
    net_since_anchor: Decimal,
    entries: Vec<LedgerEntry>,
    discrepancies: Vec<Discrepancy>,
    conflicts: usize,
    mismatches: usize,
}

impl Replay {
    fn new(opening_balance: Decimal, tolerance: Decimal) -> Self {
        Self {
            tolerance,
            balance: opening_balance,
            anchor: opening_balance,
            net_since_anchor: Decimal::ZERO,
            entries: Vec::new(),
            discrepancies: Vec::new(),
            conflicts: 0,
            mismatches: 0,
        }
    }

    fn apply(&mut self, resolved: &Resolved<'_>, sequence: u32) {
        let record = resolved.kept;
        let amount = record.amount().amount();
        let at = EntryRef::new(record.date(), sequence);
        let computed = self.balance + amount;
        self.net_since_anchor += amount;

        let (balance_after, balance_source) = match record.stated_balance() {
            Some(stated) => {
                let stated = stated.amount();
                let expected = self.anchor + self.net_since_anchor;
                self.anchor = stated;
                self.net_since_anchor = Decimal::ZERO;

                if (stated - expected).abs() <= self.tolerance {
                    (stated, BalanceSource::Stated)
                } else {
                    warn!(
                        "{} at {}: stated balance {} but expected {}",
                        record.id(),
                        at,
                        stated,
                        expected
                    );
                    self.mismatches += 1;
                    self.discrepancies.push(Discrepancy::balance_mismatch(
                        record.id(),
                        amount,
                        stated,
                        expected,
                        at,
                    ));
                    (computed, BalanceSource::Computed)
                }
            }
            None => (computed, BalanceSource::Computed),
        };

        if resolved.is_conflict() {
            warn!(
                "{}: kept {} over equally confident {:?}",
                at,
                record.id(),
                resolved.conflicting
            );
            self.conflicts += 1;
            self.discrepancies.push(Discrepancy::duplicate_conflict(
                record.date(),
                amount,
                record.id(),
                resolved.conflicting.clone(),
                at,
            ));
        }

        self.balance = balance_after;
        self.entries.push(LedgerEntry {
            date: record.date(),
            sequence,
            amount,
            balance_after,
            balance_source,
            description: record.description().to_string(),
            sources: resolved.sources(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameDayPolicy;
    use crate::core::batch::Confidence;
    use crate::ledger::discrepancy::DiscrepancyKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn account() -> AccountId {
        AccountId::new("CHK-1")
    }

    fn batch(id: u128, from: NaiveDate, to: NaiveDate) -> StatementBatch {
        StatementBatch::new(
            BatchId::from_u128(id),
            account(),
            "USD",
            DateRange::new(from, to).unwrap(),
        )
    }

    fn january() -> StatementBatch {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 3), dec!(-2000)).with_stated_balance(dec!(8000)).with_description("RENT"));
        b.add(b.record(d(1, 10), dec!(1000)).with_stated_balance(dec!(9000)).with_description("PAYROLL"));
        b.add(b.record(d(1, 20), dec!(-6000)).with_stated_balance(dec!(3000)).with_description("CAR"));
        b.add(b.record(d(1, 28), dec!(4000)).with_stated_balance(dec!(7000)).with_description("PAYROLL"));
        b
    }

    fn build(batches: Vec<StatementBatch>) -> Result<Ledger, LedgerError> {
        let mut builder = LedgerBuilder::new(account(), "USD");
        builder.add_batches(batches);
        builder.build()
    }

    fn balances(ledger: &Ledger) -> Vec<Decimal> {
        ledger.entries().iter().map(|e| e.balance_after).collect()
    }

    #[test]
    fn test_builds_ordered_ledger_with_derived_opening() {
        let ledger = build(vec![january()]).unwrap();
        assert_eq!(ledger.opening_balance(), dec!(10000));
        assert_eq!(balances(&ledger), vec![dec!(8000), dec!(9000), dec!(3000), dec!(7000)]);
        assert!(ledger
            .entries()
            .iter()
            .all(|e| e.balance_source == BalanceSource::Stated));
        assert_eq!(ledger.window(), Some(DateRange::new(d(1, 1), d(1, 31)).unwrap()));
        assert!(ledger.discrepancies().is_empty());
    }

    #[test]
    fn test_opening_derived_from_out_of_order_first_day() {
        // Printed in the wrong order: the 900 row happened first.
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 5), dec!(-300)).with_stated_balance(dec!(600)).with_description("UTILITIES"));
        b.add(b.record(d(1, 5), dec!(-100)).with_stated_balance(dec!(900)).with_description("PHONE BILL"));
        let ledger = build(vec![b]).unwrap();

        assert_eq!(ledger.opening_balance(), dec!(1000));
        assert_eq!(balances(&ledger), vec![dec!(900), dec!(600)]);
        assert!(ledger.discrepancies().is_empty());
    }

    #[test]
    fn test_opening_derived_after_unstated_days() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 2), dec!(-50)).with_description("COFFEE"));
        b.add(b.record(d(1, 5), dec!(-300)).with_stated_balance(dec!(600)).with_description("UTILITIES"));
        b.add(b.record(d(1, 5), dec!(-100)).with_stated_balance(dec!(900)).with_description("PHONE BILL"));
        let ledger = build(vec![b]).unwrap();

        assert_eq!(ledger.opening_balance(), dec!(1050));
        assert_eq!(balances(&ledger), vec![dec!(1000), dec!(900), dec!(600)]);
        assert!(ledger.discrepancies().is_empty());
    }

    #[test]
    fn test_opening_balance_zero_without_stated_balances() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 5), dec!(300)));
        b.add(b.record(d(1, 6), dec!(-100)));
        let ledger = build(vec![b]).unwrap();
        assert_eq!(ledger.opening_balance(), Decimal::ZERO);
        assert_eq!(balances(&ledger), vec![dec!(300), dec!(200)]);
    }

    #[test]
    fn test_explicit_opening_balance_wins() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 5), dec!(-100)));
        let mut builder = LedgerBuilder::new(account(), "USD").with_opening_balance(dec!(500));
        builder.add_batch(b);
        let ledger = builder.build().unwrap();
        assert_eq!(balances(&ledger), vec![dec!(400)]);
    }

    #[test]
    fn test_reupload_does_not_double_count() {
        let jan = january();
        let again = jan.reissued(BatchId::from_u128(2));
        let single = build(vec![jan.clone()]).unwrap();
        let doubled = build(vec![jan, again]).unwrap();

        assert_eq!(doubled.len(), single.len());
        assert_eq!(balances(&doubled), balances(&single));
        assert!(doubled.discrepancies().is_empty());
        assert!(doubled.entries().iter().all(|e| e.sources.len() == 2));
    }

    #[test]
    fn test_conflicting_duplicate_is_blocking() {
        let mut a = batch(1, d(1, 1), d(1, 31));
        a.add(a.record(d(1, 5), dec!(-80)).with_description("ELECTRIC COMPANY"));
        let mut b = batch(2, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 5), dec!(-80)).with_description("ELECTRIC COMPANY INC"));

        let ledger = build(vec![a, b]).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has_blocking_discrepancies());
        assert!(matches!(
            ledger.discrepancies()[0].kind,
            DiscrepancyKind::DuplicateConflict { .. }
        ));
        assert_eq!(ledger.discrepancies()[0].entries, vec![EntryRef::new(d(1, 5), 0)]);
    }

    #[test]
    fn test_higher_confidence_batch_wins_quietly() {
        let mut ocr = batch(1, d(1, 1), d(1, 31)).with_confidence(Confidence::new(dec!(0.7)).unwrap());
        ocr.add(ocr.record(d(1, 5), dec!(-80)).with_description("ELECTRlC COMPANY PAYMENT"));
        let mut csv = batch(2, d(1, 1), d(1, 31));
        csv.add(csv.record(d(1, 5), dec!(-80)).with_description("ELECTRIC COMPANY PAYMENT"));

        let ledger = build(vec![ocr, csv]).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].description, "ELECTRIC COMPANY PAYMENT");
        assert_eq!(
            ledger.entries()[0].primary_source(),
            Some(RecordId::new(BatchId::from_u128(2), 0))
        );
        assert!(ledger.discrepancies().is_empty());
    }

    #[test]
    fn test_balance_mismatch_falls_back_to_computed() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 2), dec!(-100)).with_stated_balance(dec!(900)));
        b.add(b.record(d(1, 3), dec!(-100)).with_stated_balance(dec!(750)));
        b.add(b.record(d(1, 4), dec!(-100)).with_stated_balance(dec!(650)));

        let ledger = build(vec![b]).unwrap();
        assert_eq!(balances(&ledger), vec![dec!(900), dec!(800), dec!(650)]);
        assert_eq!(ledger.entries()[1].balance_source, BalanceSource::Computed);
        assert_eq!(ledger.entries()[2].balance_source, BalanceSource::Stated);

        assert_eq!(ledger.discrepancies().len(), 1);
        let mismatch = &ledger.discrepancies()[0];
        assert!(!mismatch.is_blocking());
        match &mismatch.kind {
            DiscrepancyKind::BalanceMismatch { stated, expected, .. } => {
                assert_eq!(*stated, dec!(750));
                assert_eq!(*expected, dec!(800));
            }
            other => panic!("unexpected discrepancy {:?}", other),
        }
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 2), dec!(-100)).with_stated_balance(dec!(900)));
        b.add(b.record(d(1, 3), dec!(-33.33)).with_stated_balance(dec!(866.66)));
        let ledger = build(vec![b]).unwrap();
        assert!(ledger.discrepancies().is_empty());
        assert_eq!(ledger.closing_balance(), dec!(866.66));
    }

    #[test]
    fn test_same_day_conservative_ordering() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 2), dec!(0)).with_stated_balance(dec!(1000)));
        b.add(b.record(d(1, 5), dec!(5000)).with_description("DEPOSIT"));
        b.add(b.record(d(1, 5), dec!(-1500)).with_description("WITHDRAWAL"));

        let ledger = build(vec![b.clone()]).unwrap();
        assert_eq!(balances(&ledger), vec![dec!(1000), dec!(-500), dec!(4500)]);

        let mut builder = LedgerBuilder::new(account(), "USD").with_config(TraceConfig {
            same_day_policy: SameDayPolicy::SourceOrder,
            ..TraceConfig::default()
        });
        builder.add_batch(b);
        let source_order = builder.build().unwrap();
        assert_eq!(balances(&source_order), vec![dec!(1000), dec!(6000), dec!(4500)]);
    }

    #[test]
    fn test_coverage_gap_reported() {
        let jan = january();
        let mut mar = batch(3, d(3, 1), d(3, 31));
        mar.add(mar.record(d(3, 4), dec!(-10)));

        let ledger = build(vec![jan, mar]).unwrap();
        let gaps: Vec<DateRange> = ledger.discrepancies().iter().filter_map(|d| d.gap()).collect();
        assert_eq!(gaps, vec![DateRange::new(d(2, 1), d(2, 29)).unwrap()]);
        assert!(!ledger.has_blocking_discrepancies());
    }

    #[test]
    fn test_configured_window_beyond_coverage() {
        let mut builder = LedgerBuilder::new(account(), "USD")
            .with_analysis_window(DateRange::new(d(1, 1), d(2, 15)).unwrap());
        builder.add_batch(january());
        let ledger = builder.build().unwrap();
        let gaps: Vec<DateRange> = ledger.discrepancies().iter().filter_map(|d| d.gap()).collect();
        assert_eq!(gaps, vec![DateRange::new(d(2, 1), d(2, 15)).unwrap()]);
    }

    #[test]
    fn test_same_batch_identical_rows_both_count() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        b.add(b.record(d(1, 5), dec!(-4.50)).with_description("COFFEE"));
        b.add(b.record(d(1, 5), dec!(-4.50)).with_description("COFFEE"));
        let ledger = build(vec![b]).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.closing_balance(), dec!(-9.00));
    }

    #[test]
    fn test_rejects_foreign_batch() {
        let other = StatementBatch::new(
            BatchId::from_u128(5),
            AccountId::new("SAV-9"),
            "USD",
            DateRange::single(d(1, 1)),
        );
        let err = build(vec![other]).unwrap_err();
        assert!(matches!(err, LedgerError::BatchAccount { .. }));
    }

    #[test]
    fn test_rejects_foreign_currency() {
        let eur = StatementBatch::new(
            BatchId::from_u128(5),
            account(),
            "EUR",
            DateRange::single(d(1, 1)),
        );
        let err = build(vec![eur]).unwrap_err();
        assert!(matches!(err, LedgerError::BatchCurrency { .. }));
    }

    #[test]
    fn test_rejects_repeated_batch() {
        let err = build(vec![january(), january()]).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateBatch { .. }));
    }

    #[test]
    fn test_rejects_misfiled_record() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        let stray = batch(2, d(1, 1), d(1, 31)).record(d(1, 4), dec!(1));
        b.add(stray);
        let err = build(vec![b]).unwrap_err();
        assert!(matches!(err, LedgerError::RecordBatch { .. }));
    }

    #[test]
    fn test_rejects_repeated_record_id() {
        let mut b = batch(1, d(1, 1), d(1, 31));
        let r = b.record(d(1, 4), dec!(1));
        b.add(r.clone());
        b.add(r);
        let err = build(vec![b]).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateRecord { .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut builder = LedgerBuilder::new(account(), "USD").with_config(TraceConfig {
            similarity_threshold: 2.0,
            ..TraceConfig::default()
        });
        builder.add_batch(january());
        assert!(matches!(builder.build(), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_empty_builder_gives_empty_ledger() {
        let ledger = build(Vec::new()).unwrap();
        assert!(ledger.is_empty());
        assert!(ledger.window().is_none());
        assert!(ledger.discrepancies().is_empty());
    }
}
