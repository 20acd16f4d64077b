//! Cross-batch duplicate detection.
//!
//! Two records are the same real-world transaction when they come from
//! different batches whose coverage overlaps, fall on the same day, carry
//! the same amount, and have descriptions at least as similar as the
//! configured threshold. Rows inside one batch are never merged: a
//! statement listing two identical coffees on the same day means two
//! coffees.

use crate::core::batch::BatchId;
use crate::core::period::DateRange;
use crate::core::record::{RecordId, TransactionRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// The outcome of resolving one cluster of matching records.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    /// The record whose data goes into the ledger.
    pub kept: &'a TransactionRecord,
    /// Records merged into `kept`.
    pub merged: Vec<RecordId>,
    /// Merged records that had the same confidence as `kept` but
    /// disagreed with it on content.
    pub conflicting: Vec<RecordId>,
}

impl<'a> Resolved<'a> {
    fn single(record: &'a TransactionRecord) -> Self {
        Self {
            kept: record,
            merged: Vec::new(),
            conflicting: Vec::new(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        !self.conflicting.is_empty()
    }

    /// `kept` first, then merged records in id order.
    pub fn sources(&self) -> Vec<RecordId> {
        std::iter::once(self.kept.id())
            .chain(self.merged.iter().copied())
            .collect()
    }
}

/// Normalise a description for comparison: lower-case, alphanumerics
/// only, single spaces.
pub fn normalize_description(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sørensen–Dice coefficient over character bigrams of the normalised
/// descriptions, in `[0, 1]`.
///
/// # Examples
///
/// ```
/// use libr_trace::ledger::dedup::description_similarity;
///
/// assert_eq!(description_similarity("PAYROLL ACME", "payroll acme"), 1.0);
/// assert!(description_similarity("PAYROLL ACME CORP", "PAYROLL ACME") > 0.8);
/// assert!(description_similarity("RENT", "GROCERY") < 0.2);
/// ```
pub fn description_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_description(a);
    let b = normalize_description(b);
    if a == b {
        return 1.0;
    }

    let bigrams_a = bigrams(&a);
    let bigrams_b = bigrams(&b);
    let total = bigrams_a.len() + bigrams_b.len();
    if total == 0 {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for bg in &bigrams_a {
        *counts.entry(*bg).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for bg in &bigrams_b {
        if let Some(count) = counts.get_mut(bg) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }

    (2 * common) as f64 / total as f64
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Group records into real-world transactions and pick one record per
/// transaction.
///
/// `records` must be sorted by `(date, id)`; the output keeps that order
/// by kept record. Among matching records the highest confidence wins;
/// on a tie the lowest record id wins, and any tied record whose content
/// differs is reported as conflicting.
pub fn resolve_duplicates<'a>(
    records: &[&'a TransactionRecord],
    coverage: &HashMap<BatchId, DateRange>,
    similarity_threshold: f64,
) -> Vec<Resolved<'a>> {
    let mut buckets: BTreeMap<(NaiveDate, Decimal), Vec<&'a TransactionRecord>> = BTreeMap::new();
    for &record in records {
        buckets
            .entry((record.date(), record.amount().amount()))
            .or_default()
            .push(record);
    }

    let mut resolved = Vec::with_capacity(records.len());
    for bucket in buckets.into_values() {
        if bucket.len() == 1 {
            resolved.push(Resolved::single(bucket[0]));
            continue;
        }

        let mut clusters: Vec<Vec<&'a TransactionRecord>> = Vec::new();
        for record in bucket {
            let home = clusters.iter().position(|cluster| {
                let head = cluster[0];
                cluster.iter().all(|r| r.batch() != record.batch())
                    && coverage_overlaps(coverage, head.batch(), record.batch())
                    && description_similarity(head.description(), record.description())
                        >= similarity_threshold
            });
            match home {
                Some(i) => clusters[i].push(record),
                None => clusters.push(vec![record]),
            }
        }

        resolved.extend(clusters.into_iter().map(resolve_cluster));
    }

    resolved.sort_by_key(|r| (r.kept.date(), r.kept.id()));
    resolved
}

fn coverage_overlaps(coverage: &HashMap<BatchId, DateRange>, a: BatchId, b: BatchId) -> bool {
    match (coverage.get(&a), coverage.get(&b)) {
        (Some(ra), Some(rb)) => ra.overlaps(rb),
        _ => false,
    }
}

fn resolve_cluster(mut cluster: Vec<&TransactionRecord>) -> Resolved<'_> {
    if cluster.len() == 1 {
        return Resolved::single(cluster[0]);
    }

    // Highest confidence first, then lowest id.
    cluster.sort_by(|a, b| {
        b.confidence()
            .cmp(&a.confidence())
            .then_with(|| a.id().cmp(&b.id()))
    });

    let kept = cluster[0];
    let mut merged: Vec<RecordId> = cluster[1..].iter().map(|r| r.id()).collect();
    merged.sort();
    let mut conflicting: Vec<RecordId> = cluster[1..]
        .iter()
        .filter(|r| r.confidence() == kept.confidence() && !r.same_content(kept))
        .map(|r| r.id())
        .collect();
    conflicting.sort();

    Resolved {
        kept,
        merged,
        conflicting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use crate::core::batch::Confidence;
    use crate::core::currency::Money;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn rec(batch: u128, seq: u32, day: u32, amount: Decimal, desc: &str) -> TransactionRecord {
        TransactionRecord::new(
            RecordId::new(BatchId::from_u128(batch), seq),
            AccountId::new("A"),
            d(day),
            Money::new(amount, "USD"),
        )
        .with_description(desc)
    }

    fn coverage(batches: &[u128]) -> HashMap<BatchId, DateRange> {
        batches
            .iter()
            .map(|b| (BatchId::from_u128(*b), DateRange::new(d(1), d(31)).unwrap()))
            .collect()
    }

    fn run<'a>(records: &[&'a TransactionRecord], batches: &[u128]) -> Vec<Resolved<'a>> {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| (r.date(), r.id()));
        resolve_duplicates(&sorted, &coverage(batches), 0.85)
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description("  POS  #1234 -- Coffee!! "), "pos 1234 coffee");
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(description_similarity("", ""), 1.0);
        assert_eq!(description_similarity("a", "b"), 0.0);
        assert_eq!(description_similarity("abc", "abc"), 1.0);
    }

    #[test]
    fn test_same_batch_rows_are_not_merged() {
        let a = rec(1, 0, 5, dec!(-4.50), "COFFEE");
        let b = rec(1, 1, 5, dec!(-4.50), "COFFEE");
        let out = run(&[&a, &b], &[1]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_reupload_merges_silently() {
        let a0 = rec(1, 0, 5, dec!(-4.50), "COFFEE");
        let a1 = rec(1, 1, 5, dec!(-4.50), "COFFEE");
        let b0 = rec(2, 0, 5, dec!(-4.50), "COFFEE");
        let b1 = rec(2, 1, 5, dec!(-4.50), "COFFEE");
        let out = run(&[&a0, &a1, &b0, &b1], &[1, 2]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.merged.len() == 1 && !r.is_conflict()));
        assert_eq!(out[0].kept.id(), a0.id());
        assert_eq!(out[0].merged, vec![b0.id()]);
    }

    #[test]
    fn test_higher_confidence_wins() {
        let low = rec(1, 0, 5, dec!(-80), "ELECTRIC CO")
            .with_confidence(Confidence::new(dec!(0.6)).unwrap());
        let high = rec(2, 0, 5, dec!(-80), "ELECTRIC CO.");
        let out = run(&[&low, &high], &[1, 2]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kept.id(), high.id());
        assert!(!out[0].is_conflict());
    }

    #[test]
    fn test_equal_confidence_differing_content_conflicts() {
        let a = rec(1, 0, 5, dec!(-80), "ELECTRIC COMPANY");
        let b = rec(2, 0, 5, dec!(-80), "ELECTRIC COMPANY INC");
        let out = run(&[&a, &b], &[1, 2]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kept.id(), a.id());
        assert_eq!(out[0].conflicting, vec![b.id()]);
        assert_eq!(out[0].sources(), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_dissimilar_descriptions_stay_separate() {
        let a = rec(1, 0, 5, dec!(-80), "ELECTRIC COMPANY");
        let b = rec(2, 0, 5, dec!(-80), "GAS STATION");
        let out = run(&[&a, &b], &[1, 2]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_different_amount_or_date_stay_separate() {
        let a = rec(1, 0, 5, dec!(-80), "ELECTRIC");
        let b = rec(2, 0, 5, dec!(-81), "ELECTRIC");
        let c = rec(2, 1, 6, dec!(-80), "ELECTRIC");
        let out = run(&[&a, &b, &c], &[1, 2]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_non_overlapping_coverage_never_matches() {
        let a = rec(1, 0, 5, dec!(-80), "ELECTRIC");
        let b = rec(2, 0, 5, dec!(-80), "ELECTRIC");
        let mut cov = HashMap::new();
        cov.insert(BatchId::from_u128(1), DateRange::new(d(1), d(5)).unwrap());
        cov.insert(BatchId::from_u128(2), DateRange::new(d(6), d(10)).unwrap());
        let out = resolve_duplicates(&[&a, &b], &cov, 0.85);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_amount_scale_does_not_matter() {
        let a = rec(1, 0, 5, dec!(-80), "ELECTRIC");
        let b = rec(2, 0, 5, dec!(-80.00), "ELECTRIC");
        let out = run(&[&a, &b], &[1, 2]);
        assert_eq!(out.len(), 1);
    }
}
