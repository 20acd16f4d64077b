//! Intra-day ordering.
//!
//! Statements give dates at day precision. When a day has several
//! transactions their order decides the intermediate balances, and
//! therefore what the trace sees. The printed running balances settle the
//! order when they can; otherwise the configured [`SameDayPolicy`] does.

use crate::config::SameDayPolicy;
use crate::ledger::dedup::Resolved;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a day's entries ended up in the order they did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBasis {
    /// Zero or one entry: nothing to decide.
    Single,
    /// Every entry carries a stated balance and exactly one chain
    /// reproduces them.
    StatedBalances,
    /// Unpinned entries placed debits-first.
    Conservative,
    /// Unpinned entries left in statement order.
    SourceOrder,
}

/// Order one day's resolved records.
///
/// `day` must be in source order (by record id). `prior_balance` is the
/// balance carried in from the previous day.
///
/// Records with a stated balance are pinned: whatever precedes one of
/// them in the statement stays before it. Only the runs of records
/// without a stated balance between pins are reordered by the policy.
pub fn order_day<'a>(
    day: Vec<Resolved<'a>>,
    prior_balance: Decimal,
    tolerance: Decimal,
    policy: SameDayPolicy,
) -> (Vec<Resolved<'a>>, OrderBasis) {
    if day.len() <= 1 {
        return (day, OrderBasis::Single);
    }

    if day.iter().all(|r| r.kept.stated_balance().is_some()) {
        if replays_cleanly(&day, prior_balance, tolerance) {
            return (day, OrderBasis::StatedBalances);
        }
        if let Some(order) = chain_order(&day, prior_balance, tolerance) {
            let mut slots: Vec<Option<Resolved<'a>>> = day.into_iter().map(Some).collect();
            let ordered = order.into_iter().filter_map(|i| slots[i].take()).collect();
            return (ordered, OrderBasis::StatedBalances);
        }
    }

    match policy {
        SameDayPolicy::SourceOrder => (day, OrderBasis::SourceOrder),
        SameDayPolicy::Conservative => (conservative(day), OrderBasis::Conservative),
    }
}

/// Whether the stated balances of `day` follow from `prior`, either in
/// statement order or along a unique chain.
pub(crate) fn settles(day: &[Resolved<'_>], prior: Decimal, tolerance: Decimal) -> bool {
    replays_cleanly(day, prior, tolerance) || chain_order(day, prior, tolerance).is_some()
}

fn stated(r: &Resolved<'_>) -> Option<Decimal> {
    r.kept.stated_balance().map(|m| m.amount())
}

fn amount(r: &Resolved<'_>) -> Decimal {
    r.kept.amount().amount()
}

fn replays_cleanly(day: &[Resolved<'_>], prior: Decimal, tolerance: Decimal) -> bool {
    let mut balance = prior;
    for r in day {
        balance += amount(r);
        if let Some(s) = stated(r) {
            if (s - balance).abs() > tolerance {
                return false;
            }
            balance = s;
        }
    }
    true
}

/// Find the unique order in which each stated balance follows from the
/// previous one. Candidates that are indistinguishable (same amount and
/// same stated balance) count as one.
fn chain_order(day: &[Resolved<'_>], prior: Decimal, tolerance: Decimal) -> Option<Vec<usize>> {
    let mut remaining: Vec<usize> = (0..day.len()).collect();
    let mut order = Vec::with_capacity(day.len());
    let mut balance = prior;

    while !remaining.is_empty() {
        let candidates: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| {
                stated(&day[i])
                    .map(|s| (balance + amount(&day[i]) - s).abs() <= tolerance)
                    .unwrap_or(false)
            })
            .collect();

        let first = *candidates.first()?;
        let interchangeable = candidates
            .iter()
            .all(|&i| amount(&day[i]) == amount(&day[first]) && stated(&day[i]) == stated(&day[first]));
        if !interchangeable {
            return None;
        }

        balance = stated(&day[first])?;
        order.push(first);
        remaining.retain(|&i| i != first);
    }

    Some(order)
}

/// Debits before credits, largest debit first, smallest credit first.
/// This reaches the lowest balance any ordering of the run could reach.
fn conservative(day: Vec<Resolved<'_>>) -> Vec<Resolved<'_>> {
    let mut out = Vec::with_capacity(day.len());
    let mut run: Vec<Resolved<'_>> = Vec::new();

    for r in day {
        if stated(&r).is_some() {
            flush_run(&mut run, &mut out);
            out.push(r);
        } else {
            run.push(r);
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run<'a>(run: &mut Vec<Resolved<'a>>, out: &mut Vec<Resolved<'a>>) {
    run.sort_by_key(|r| (amount(r) >= Decimal::ZERO, amount(r), r.kept.id()));
    out.append(run);
}
