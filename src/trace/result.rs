use crate::audit::provenance::ContentHash;
use crate::core::account::AccountId;
use crate::core::claim::ClaimId;
use crate::core::currency::CurrencyCode;
use crate::ledger::discrepancy::Discrepancy;
use crate::ledger::entry::EntryRef;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A drop in the traceable amount caused by one ledger entry.
///
/// Only strict drops are recorded. Once the traceable amount reaches zero
/// no further events follow, so overdrafts after full depletion are not
/// listed here; they remain visible in the replay series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub date: NaiveDate,
    /// The entry whose balance triggered the drop.
    pub entry: EntryRef,
    pub prior: Decimal,
    /// `max(balance_after, 0)`.
    pub new: Decimal,
    /// `prior - new`, always positive.
    pub delta: Decimal,
    pub balance_after: Decimal,
    pub description: String,
}

/// State after one replayed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePoint {
    pub date: NaiveDate,
    pub sequence: u32,
    pub balance: Decimal,
    pub traceable: Decimal,
    /// Portion of the balance that is traceable separate property.
    pub separate: Decimal,
    /// Remainder of a positive balance.
    pub marital: Decimal,
    pub is_dip: bool,
}

impl TracePoint {
    pub fn entry_ref(&self) -> EntryRef {
        EntryRef::new(self.date, self.sequence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowPoint {
    pub date: NaiveDate,
    pub sequence: u32,
    pub balance: Decimal,
}

/// The outcome of tracing one claim through one ledger.
///
/// A pure function of the ledger content and the claim: `ledger_hash` and
/// `claim_hash` identify both inputs and `provenance` binds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    pub claim_id: ClaimId,
    pub claim_name: Option<String>,
    pub account: AccountId,
    pub currency: CurrencyCode,
    pub claim_date: NaiveDate,
    pub claimed_amount: Decimal,
    pub initial_traceable: Decimal,
    pub final_traceable: Decimal,
    pub events: Vec<TraceEvent>,
    pub series: Vec<TracePoint>,
    pub lowest_balance: Option<LowPoint>,
    pub complete: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub ledger_hash: ContentHash,
    pub claim_hash: ContentHash,
    pub provenance: ContentHash,
}

impl TraceResult {
    /// Sum of all event deltas.
    pub fn total_reduction(&self) -> Decimal {
        self.events.iter().map(|e| e.delta).sum()
    }

    pub fn is_fully_traced(&self) -> bool {
        self.final_traceable == self.claimed_amount
    }

    pub fn has_blocking_discrepancies(&self) -> bool {
        self.discrepancies.iter().any(|d| d.is_blocking())
    }

    /// A human must look at this before it is relied on.
    pub fn requires_review(&self) -> bool {
        !self.complete || self.has_blocking_discrepancies()
    }

    /// Check the LIBR invariants: the series never rises, stays within
    /// `[0, claimed]`, and every event matches the entry that caused it.
    pub fn is_valid(&self) -> bool {
        if self.initial_traceable < Decimal::ZERO || self.initial_traceable > self.claimed_amount {
            return false;
        }

        let mut traceable = self.initial_traceable;
        for point in &self.series {
            if point.traceable > traceable || point.traceable < Decimal::ZERO {
                return false;
            }
            traceable = point.traceable;
        }
        if traceable != self.final_traceable {
            return false;
        }

        let mut prior = self.initial_traceable;
        for event in &self.events {
            if event.prior != prior
                || event.new >= event.prior
                || event.delta != event.prior - event.new
                || event.new != event.balance_after.max(Decimal::ZERO)
            {
                return false;
            }
            prior = event.new;
        }
        prior == self.final_traceable
    }
}

impl fmt::Display for TraceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Trace {} ===", self.claim_id)?;
        if let Some(name) = &self.claim_name {
            writeln!(f, "Claim:             {}", name)?;
        }
        writeln!(f, "Account:           {}", self.account)?;
        writeln!(f, "Claim date:        {}", self.claim_date)?;
        writeln!(f, "Claimed:           {} {}", self.claimed_amount, self.currency)?;
        if self.initial_traceable != self.claimed_amount {
            writeln!(f, "Initial traceable: {} {}", self.initial_traceable, self.currency)?;
        }
        writeln!(f, "Final traceable:   {} {}", self.final_traceable, self.currency)?;
        if let Some(low) = &self.lowest_balance {
            writeln!(f, "Lowest balance:    {} on {}", low.balance, low.date)?;
        }
        writeln!(f, "Complete:          {}", if self.complete { "yes" } else { "NO" })?;
        writeln!(f, "Provenance:        {}", self.provenance)?;

        writeln!(f, "\n--- Commingling events ({}) ---", self.events.len())?;
        for e in &self.events {
            writeln!(
                f,
                "  {:<12} {:>15} -> {:>15} (-{}) {}",
                e.entry.to_string(),
                e.prior,
                e.new,
                e.delta,
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
