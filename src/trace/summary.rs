use crate::core::account::AccountId;
use crate::core::claim::ClaimId;
use crate::core::currency::CurrencyCode;
use crate::trace::result::{LowPoint, TraceEvent, TraceResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub balance: Decimal,
    pub traceable: Decimal,
}

/// End-of-day position, carried forward over days without activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub total: Decimal,
    pub separate: Decimal,
    pub marital: Decimal,
    pub traceable: Decimal,
    /// Some entry on this day lowered the traceable amount.
    pub is_dip: bool,
}

/// Report-ready aggregate of a [`TraceResult`].
///
/// Read-only over the result: nothing here is recomputed, only selected
/// and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub claim_id: ClaimId,
    pub claim_name: Option<String>,
    pub account: AccountId,
    pub currency: CurrencyCode,
    pub claim_date: NaiveDate,
    pub claimed_amount: Decimal,
    pub final_traceable: Decimal,
    /// `final / claimed * 100`, two decimal places.
    pub retained_percent: Decimal,
    /// The event with the largest delta; the earliest on a tie.
    pub worst_event: Option<TraceEvent>,
    pub event_count: usize,
    pub lowest_balance: Option<LowPoint>,
    pub complete: bool,
    pub requires_review: bool,
    /// Unresolved duplicate conflicts are carried from the ledger.
    pub blocking_discrepancies: bool,
    pub chart: Vec<ChartPoint>,
    pub daily: Vec<DailySnapshot>,
}

impl TraceSummary {
    pub fn from_result(result: &TraceResult) -> Self {
        let mut retained_percent = if result.claimed_amount.is_zero() {
            Decimal::ZERO
        } else {
            (result.final_traceable / result.claimed_amount * Decimal::ONE_HUNDRED).round_dp(2)
        };
        retained_percent.rescale(2);

        let mut worst_event: Option<&TraceEvent> = None;
        for event in &result.events {
            if worst_event.map_or(true, |w| event.delta > w.delta) {
                worst_event = Some(event);
            }
        }

        let chart = result
            .series
            .iter()
            .map(|p| ChartPoint {
                date: p.date,
                balance: p.balance,
                traceable: p.traceable,
            })
            .collect();

        TraceSummary {
            claim_id: result.claim_id,
            claim_name: result.claim_name.clone(),
            account: result.account.clone(),
            currency: result.currency.clone(),
            claim_date: result.claim_date,
            claimed_amount: result.claimed_amount,
            final_traceable: result.final_traceable,
            retained_percent,
            worst_event: worst_event.cloned(),
            event_count: result.events.len(),
            lowest_balance: result.lowest_balance,
            complete: result.complete,
            requires_review: result.requires_review(),
            blocking_discrepancies: result.has_blocking_discrepancies(),
            chart,
            daily: daily_snapshots(result),
        }
    }

    /// Retained fraction in `[0, 1]` for display.
    pub fn retained_ratio(&self) -> f64 {
        if self.claimed_amount.is_zero() {
            return 0.0;
        }
        let ratio = self.final_traceable / self.claimed_amount;
        ratio.to_string().parse::<f64>().unwrap_or(0.0)
    }

    /// Plain-language conclusion for the report.
    pub fn narrative(&self) -> String {
        let low = match &self.lowest_balance {
            Some(low) => format!("{} {} on {}", low.balance.round_dp(2), self.currency, low.date),
            None => "an unknown balance".to_string(),
        };

        let mut text = if self.claimed_amount.is_zero() {
            "No separate property was claimed.".to_string()
        } else if self.final_traceable == self.claimed_amount {
            format!(
                "Full trace: the entire {} {} remains traceable. The account never fell below this amount after {}.",
                self.claimed_amount.round_dp(2),
                self.currency,
                self.claim_date
            )
        } else if self.final_traceable > Decimal::ZERO {
            format!(
                "Partial trace: {} {} ({}%) of {} {} remains traceable. The account fell to {}.",
                self.final_traceable.round_dp(2),
                self.currency,
                self.retained_percent,
                self.claimed_amount.round_dp(2),
                self.currency,
                low
            )
        } else {
            format!(
                "Trace failed: the separate property was fully commingled. The account fell to {}.",
                low
            )
        };

        if self.requires_review {
            let mut causes = Vec::new();
            if !self.complete {
                causes.push("statements do not cover the whole period, so a lower balance may be missing");
            }
            if self.blocking_discrepancies {
                causes.push("unresolved duplicate conflicts in the source statements");
            }
            text.push_str(&format!(" Pending review: {}.", causes.join("; ")));
        }
        text
    }
}

fn daily_snapshots(result: &TraceResult) -> Vec<DailySnapshot> {
    let mut days: Vec<DailySnapshot> = Vec::new();

    for point in &result.series {
        // Carry the last close forward to the day before this point.
        while let Some(last) = days.last() {
            let Some(next) = last.date.succ_opt() else { break };
            if next >= point.date {
                break;
            }
            let carried = DailySnapshot {
                date: next,
                is_dip: false,
                ..last.clone()
            };
            days.push(carried);
        }

        let snapshot = DailySnapshot {
            date: point.date,
            total: point.balance,
            separate: point.separate,
            marital: point.marital,
            traceable: point.traceable,
            is_dip: point.is_dip,
        };
        match days.last_mut() {
            Some(last) if last.date == point.date => {
                let is_dip = last.is_dip || point.is_dip;
                *last = DailySnapshot { is_dip, ..snapshot };
            }
            _ => days.push(snapshot),
        }
    }
    days
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Trace Summary ===")?;
        if let Some(name) = &self.claim_name {
            writeln!(f, "Claim:           {}", name)?;
        }
        writeln!(f, "Account:         {}", self.account)?;
        writeln!(f, "Claimed:         {} {} on {}", self.claimed_amount, self.currency, self.claim_date)?;
        writeln!(f, "Traceable:       {} {}", self.final_traceable, self.currency)?;
        writeln!(f, "Retained:        {}%", self.retained_percent)?;
        writeln!(f, "Events:          {}", self.event_count)?;
        if let Some(worst) = &self.worst_event {
            writeln!(
                f,
                "Worst event:     {} -{} ({})",
                worst.date, worst.delta, worst.description
            )?;
        }
        writeln!(f, "Complete:        {}", if self.complete { "yes" } else { "NO" })?;
        writeln!(f, "\n{}", self.narrative())
    }
}
