use crate::audit::provenance::{provenance_hash, ContentHash, CLAIM_DOMAIN};
use crate::core::claim::SeparateClaim;
use crate::core::period::DateRange;
use crate::ledger::entry::Ledger;
use crate::trace::result::{LowPoint, TraceEvent, TracePoint, TraceResult};
use crate::trace::{InvalidClaimReason, TraceError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;

/// The LIBR trace engine.
///
/// Stateless: every method is a pure function of its arguments.
pub struct TraceEngine;

impl TraceEngine {
    /// Replay `ledger` from the claim date and apply the lowest
    /// intermediate balance rule.
    ///
    /// # Algorithm
    ///
    /// 1. Start with `traceable = claimed`. If the claim predates the
    ///    ledger, the anchor balance caps it: `min(claimed, max(anchor, 0))`.
    /// 2. For each entry dated on or after the claim date, in ledger order,
    ///    let `floor = max(balance_after, 0)`. If `floor < traceable`, record
    ///    an event and lower `traceable` to `floor`.
    /// 3. Later deposits never raise `traceable` again.
    ///
    /// Single pass, O(n) in the number of replayed entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use libr_trace::prelude::*;
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    /// let account = AccountId::new("CHK");
    /// let mut jan = StatementBatch::new(
    ///     BatchId::from_u128(1),
    ///     account.clone(),
    ///     "USD",
    ///     DateRange::new(d(1), d(31)).unwrap(),
    /// );
    /// jan.add(jan.record(d(1), dec!(10000)).with_stated_balance(dec!(10000)));
    /// jan.add(jan.record(d(5), dec!(-2000)));
    /// jan.add(jan.record(d(9), dec!(1000)));
    /// let mut builder = LedgerBuilder::new(account.clone(), "USD");
    /// builder.add_batch(jan);
    /// let ledger = builder.build().unwrap();
    ///
    /// let claim = SeparateClaim::new(
    ///     ClaimId::from_u128(1),
    ///     account,
    ///     Money::new(dec!(10000), "USD"),
    ///     d(1),
    /// )
    /// .unwrap();
    /// let result = TraceEngine::trace(&ledger, &claim).unwrap();
    /// assert_eq!(result.final_traceable, dec!(8000));
    /// assert_eq!(result.events.len(), 1);
    /// assert!(result.complete);
    /// ```
    pub fn trace(ledger: &Ledger, claim: &SeparateClaim) -> Result<TraceResult, TraceError> {
        let invalid = |reason: InvalidClaimReason| TraceError::InvalidClaim {
            claim: claim.id(),
            account: claim.account().clone(),
            claim_date: claim.claim_date(),
            reason,
        };

        claim.validate().map_err(|e| invalid(e.into()))?;
        if claim.account() != ledger.account() {
            return Err(invalid(InvalidClaimReason::AccountMismatch {
                ledger: ledger.account().clone(),
            }));
        }
        if claim.currency() != ledger.currency() {
            return Err(invalid(InvalidClaimReason::CurrencyMismatch {
                claim: claim.currency().clone(),
                ledger: ledger.currency().clone(),
            }));
        }

        let claimed = claim.claimed_amount().amount();
        let claim_date = claim.claim_date();
        let initial_traceable = match ledger.first_date() {
            Some(first) if claim_date >= first => claimed,
            first => match claim.anchor_balance() {
                Some(anchor) => claimed.min(anchor.amount().max(Decimal::ZERO)),
                None => {
                    return Err(invalid(match first {
                        Some(first_entry) => InvalidClaimReason::Unanchored { first_entry },
                        None => InvalidClaimReason::NoLedgerData,
                    }))
                }
            },
        };

        let mut traceable = initial_traceable;
        let mut events = Vec::new();
        let mut series = Vec::new();
        let mut lowest_balance: Option<LowPoint> = None;

        for entry in ledger.entries_from(claim_date) {
            let floor = entry.balance_after.max(Decimal::ZERO);
            let is_dip = floor < traceable;
            if is_dip {
                debug!(
                    "claim {}: {} balance {} drops traceable {} -> {}",
                    claim.id(),
                    entry.entry_ref(),
                    entry.balance_after,
                    traceable,
                    floor
                );
                events.push(TraceEvent {
                    date: entry.date,
                    entry: entry.entry_ref(),
                    prior: traceable,
                    new: floor,
                    delta: traceable - floor,
                    balance_after: entry.balance_after,
                    description: entry.description.clone(),
                });
                traceable = floor;
            }

            if lowest_balance.map_or(true, |low| entry.balance_after < low.balance) {
                lowest_balance = Some(LowPoint {
                    date: entry.date,
                    sequence: entry.sequence,
                    balance: entry.balance_after,
                });
            }

            let separate = traceable.min(floor);
            series.push(TracePoint {
                date: entry.date,
                sequence: entry.sequence,
                balance: entry.balance_after,
                traceable,
                separate,
                marital: (entry.balance_after - separate).max(Decimal::ZERO),
                is_dip,
            });
        }

        let complete = Self::is_complete(ledger, claim_date);
        let claim_hash = ContentHash::of(CLAIM_DOMAIN, claim)?;
        let provenance = provenance_hash(ledger.content_hash(), &claim_hash);

        info!(
            "claim {}: {} -> {} {} over {} entries, {} events{}",
            claim.id(),
            claimed,
            traceable,
            ledger.currency(),
            series.len(),
            events.len(),
            if complete { "" } else { " (incomplete coverage)" }
        );

        Ok(TraceResult {
            claim_id: claim.id(),
            claim_name: claim.name().map(str::to_string),
            account: ledger.account().clone(),
            currency: ledger.currency().clone(),
            claim_date,
            claimed_amount: claimed,
            initial_traceable,
            final_traceable: traceable,
            events,
            series,
            lowest_balance,
            complete,
            discrepancies: ledger.discrepancies().to_vec(),
            ledger_hash: ledger.content_hash().clone(),
            claim_hash,
            provenance,
        })
    }

    /// Trace several claims against one ledger, in claim-date order.
    ///
    /// Each claim is traced independently; a failed claim yields an `Err`
    /// in its slot and nothing else.
    pub fn trace_all(
        ledger: &Ledger,
        claims: &[SeparateClaim],
    ) -> Vec<Result<TraceResult, TraceError>> {
        let mut ordered: Vec<&SeparateClaim> = claims.iter().collect();
        ordered.sort_by_key(|c| (c.claim_date(), c.id()));

        ordered
            .into_iter()
            .map(|claim| {
                let result = Self::trace(ledger, claim);
                if let Err(e) = &result {
                    warn!("{}", e);
                }
                result
            })
            .collect()
    }

    /// Whether statements cover every day from `claim_date` to the end of
    /// the ledger's analysis window.
    pub fn is_complete(ledger: &Ledger, claim_date: NaiveDate) -> bool {
        let Some(window) = ledger.window() else {
            return false;
        };
        if claim_date < window.start() {
            return false;
        }
        match DateRange::new(claim_date, window.end()) {
            Ok(range) => ledger.gaps_within(&range).is_empty(),
            Err(_) => false,
        }
    }
}
