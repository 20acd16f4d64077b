use crate::audit::cache::TraceCache;
use crate::case::repository::{CaseRepository, RepositoryError, StoredOutcome};
use crate::config::TraceConfig;
use crate::core::account::AccountId;
use crate::core::claim::{ClaimId, SeparateClaim};
use crate::ledger::builder::LedgerBuilder;
use crate::ledger::entry::Ledger;
use crate::ledger::LedgerError;
use crate::trace::result::TraceResult;
use crate::trace::summary::TraceSummary;
use crate::trace::TraceError;
use log::{error, info};
use std::fmt;

/// Outcome of one claim.
#[derive(Debug)]
pub struct ClaimOutcome {
    pub claim: ClaimId,
    pub result: Result<TraceResult, TraceError>,
}

/// Everything computed for one account.
///
/// When the ledger cannot be built, `claims` is empty and every claim of
/// the account is stored as failed with the ledger error.
#[derive(Debug)]
pub struct AccountReport {
    pub account: AccountId,
    pub ledger: Result<Ledger, LedgerError>,
    pub claims: Vec<ClaimOutcome>,
}

impl AccountReport {
    pub fn traced(&self) -> impl Iterator<Item = &TraceResult> {
        self.claims.iter().filter_map(|c| c.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (ClaimId, &TraceError)> {
        self.claims
            .iter()
            .filter_map(|c| c.result.as_ref().err().map(|e| (c.claim, e)))
    }

    pub fn summaries(&self) -> Vec<TraceSummary> {
        self.traced().map(TraceSummary::from_result).collect()
    }

    pub fn is_ok(&self) -> bool {
        self.ledger.is_ok() && self.claims.iter().all(|c| c.result.is_ok())
    }
}

impl fmt::Display for AccountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ledger {
            Ok(ledger) => write!(f, "{}", ledger)?,
            Err(e) => writeln!(f, "=== Ledger {} FAILED: {} ===", self.account, e)?,
        }
        for summary in self.summaries() {
            writeln!(f)?;
            write!(f, "{}", summary)?;
        }
        for (claim, e) in self.failed() {
            writeln!(f, "\nClaim {} FAILED: {}", claim, e)?;
        }
        Ok(())
    }
}

/// Builds ledgers and traces claims for the accounts in a repository.
///
/// Accounts are independent: a failure in one never stops another.
pub struct CaseRunner<R: CaseRepository> {
    repository: R,
    config: TraceConfig,
    cache: TraceCache,
}

impl<R: CaseRepository> CaseRunner<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            config: TraceConfig::default(),
            cache: TraceCache::new(),
        }
    }

    pub fn with_config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &TraceCache {
        &self.cache
    }

    /// Build the ledger of `account` and trace its claims in claim-date
    /// order. Only repository failures are returned as `Err`.
    pub fn run_account(&mut self, account: &AccountId) -> Result<AccountReport, RepositoryError> {
        let profile = self.repository.account(account)?;
        let batches = self.repository.batches(account)?;
        let mut claims = self.repository.claims(account)?;
        claims.sort_by_key(|c| (c.claim_date(), c.id()));

        let mut builder =
            LedgerBuilder::new(profile.id.clone(), profile.currency.clone()).with_config(self.config.clone());
        builder.add_batches(batches);

        let ledger = match builder.build() {
            Ok(ledger) => ledger,
            Err(e) => {
                error!("account {}: ledger failed: {}", account, e);
                self.store_ledger_failure(account, &claims, &e)?;
                return Ok(AccountReport {
                    account: account.clone(),
                    ledger: Err(e),
                    claims: Vec::new(),
                });
            }
        };

        let mut outcomes = Vec::with_capacity(claims.len());
        for claim in &claims {
            let result = self.cache.get_or_trace(&ledger, claim);
            let stored = match &result {
                Ok(traced) => StoredOutcome::Traced(traced.clone()),
                Err(e) => {
                    error!("{}", e);
                    StoredOutcome::Failed {
                        account: account.clone(),
                        claim: claim.id(),
                        error: e.to_string(),
                    }
                }
            };
            self.repository.store_outcome(stored)?;
            outcomes.push(ClaimOutcome {
                claim: claim.id(),
                result,
            });
        }

        info!(
            "account {}: {} claims traced, {} failed",
            account,
            outcomes.iter().filter(|o| o.result.is_ok()).count(),
            outcomes.iter().filter(|o| o.result.is_err()).count()
        );

        Ok(AccountReport {
            account: account.clone(),
            ledger: Ok(ledger),
            claims: outcomes,
        })
    }

    /// Run every account in the repository, in account id order.
    pub fn run_all(&mut self) -> Result<Vec<AccountReport>, RepositoryError> {
        let accounts = self.repository.accounts()?;
        let mut reports = Vec::with_capacity(accounts.len());
        for profile in accounts {
            reports.push(self.run_account(&profile.id)?);
        }
        Ok(reports)
    }

    fn store_ledger_failure(
        &self,
        account: &AccountId,
        claims: &[SeparateClaim],
        e: &LedgerError,
    ) -> Result<(), RepositoryError> {
        for claim in claims {
            self.repository.store_outcome(StoredOutcome::Failed {
                account: account.clone(),
                claim: claim.id(),
                error: format!("ledger could not be built: {}", e),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::repository::{AccountProfile, InMemoryCaseRepository};
    use crate::core::batch::{BatchId, StatementBatch};
    use crate::core::currency::Money;
    use crate::core::period::DateRange;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn claim(id: u128, account: &str, amount: rust_decimal::Decimal, day: u32) -> SeparateClaim {
        SeparateClaim::new(
            ClaimId::from_u128(id),
            AccountId::new(account),
            Money::new(amount, "USD"),
            d(day),
        )
        .unwrap()
    }

    fn repository() -> InMemoryCaseRepository {
        let repo = InMemoryCaseRepository::new();
        repo.insert_account(AccountProfile::new(AccountId::new("GOOD"), "USD")).unwrap();
        repo.insert_account(AccountProfile::new(AccountId::new("BAD"), "USD")).unwrap();

        let mut good = StatementBatch::new(
            BatchId::from_u128(1),
            AccountId::new("GOOD"),
            "USD",
            DateRange::new(d(1), d(30)).unwrap(),
        );
        good.add(good.record(d(2), dec!(8000)).with_stated_balance(dec!(8000)));
        good.add(good.record(d(10), dec!(-5000)).with_stated_balance(dec!(3000)));
        repo.add_batch(good).unwrap();

        // Same batch delivered twice: the builder rejects the account.
        let bad = StatementBatch::new(
            BatchId::from_u128(2),
            AccountId::new("BAD"),
            "USD",
            DateRange::new(d(1), d(30)).unwrap(),
        );
        repo.add_batch(bad.clone()).unwrap();
        repo.add_batch(bad).unwrap();

        repo.add_claim(claim(1, "GOOD", dec!(6000), 2)).unwrap();
        repo.add_claim(claim(2, "GOOD", dec!(6000), 1)).unwrap();
        repo.add_claim(claim(3, "BAD", dec!(100), 5)).unwrap();
        repo
    }

    #[test]
    fn test_ledger_failure_is_isolated() {
        let mut runner = CaseRunner::new(repository());
        let reports = runner.run_all().unwrap();
        assert_eq!(reports.len(), 2);

        let bad = &reports[0];
        assert_eq!(bad.account, AccountId::new("BAD"));
        assert!(matches!(bad.ledger, Err(LedgerError::DuplicateBatch { .. })));

        let good = &reports[1];
        assert!(good.ledger.is_ok());
        assert_eq!(good.claims.len(), 2);
        // The unanchored claim dated before the ledger fails alone.
        assert_eq!(good.failed().count(), 1);
        let traced: Vec<&TraceResult> = good.traced().collect();
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0].final_traceable, dec!(3000));

        let outcomes = runner.repository().outcomes().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, StoredOutcome::Failed { claim, .. } if *claim == ClaimId::from_u128(3))));
    }

    #[test]
    fn test_rerun_uses_cache() {
        let mut runner = CaseRunner::new(repository());
        runner.run_account(&AccountId::new("GOOD")).unwrap();
        runner.run_account(&AccountId::new("GOOD")).unwrap();
        assert_eq!(runner.cache().hits(), 1);
        assert_eq!(runner.cache().misses(), 3);
    }

    #[test]
    fn test_unknown_account_is_repository_error() {
        let mut runner = CaseRunner::new(repository());
        assert!(runner.run_account(&AccountId::new("NOPE")).is_err());
    }
}
