use crate::core::account::AccountId;
use crate::core::batch::StatementBatch;
use crate::core::claim::{ClaimId, SeparateClaim};
use crate::core::currency::CurrencyCode;
use crate::trace::result::TraceResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// What the repository knows about an account before any ledger exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub name: Option<String>,
}

impl AccountProfile {
    pub fn new(id: AccountId, currency: impl Into<CurrencyCode>) -> Self {
        Self {
            id,
            currency: currency.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The result of one claim's computation as handed back for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoredOutcome {
    Traced(TraceResult),
    Failed {
        account: AccountId,
        claim: ClaimId,
        error: String,
    },
}

impl StoredOutcome {
    pub fn claim(&self) -> ClaimId {
        match self {
            StoredOutcome::Traced(result) => result.claim_id,
            StoredOutcome::Failed { claim, .. } => *claim,
        }
    }
}

/// Source of case inputs and sink of trace outcomes.
///
/// Implementations are synchronous: loading happens before a computation
/// starts and storing after it ends, never during.
pub trait CaseRepository: Send + Sync {
    fn accounts(&self) -> RepositoryResult<Vec<AccountProfile>>;

    fn account(&self, id: &AccountId) -> RepositoryResult<AccountProfile>;

    fn batches(&self, account: &AccountId) -> RepositoryResult<Vec<StatementBatch>>;

    fn claims(&self, account: &AccountId) -> RepositoryResult<Vec<SeparateClaim>>;

    fn store_outcome(&self, outcome: StoredOutcome) -> RepositoryResult<()>;
}

#[derive(Debug)]
struct AccountRecord {
    profile: AccountProfile,
    batches: Vec<StatementBatch>,
    claims: Vec<SeparateClaim>,
}

/// In-memory reference repository. Deterministic: accounts are listed in
/// id order, batches and claims in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryCaseRepository {
    accounts: RwLock<BTreeMap<AccountId, AccountRecord>>,
    outcomes: RwLock<Vec<StoredOutcome>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, profile: AccountProfile) -> RepositoryResult<()> {
        let mut guard = self
            .accounts
            .write()
            .map_err(|_| RepositoryError::Backend("accounts lock poisoned".to_string()))?;
        if guard.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict(format!(
                "account {} already exists",
                profile.id
            )));
        }
        guard.insert(
            profile.id.clone(),
            AccountRecord {
                profile,
                batches: Vec::new(),
                claims: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn add_batch(&self, batch: StatementBatch) -> RepositoryResult<()> {
        let mut guard = self
            .accounts
            .write()
            .map_err(|_| RepositoryError::Backend("accounts lock poisoned".to_string()))?;
        let record = guard
            .get_mut(batch.account())
            .ok_or_else(|| RepositoryError::NotFound(format!("account {}", batch.account())))?;
        record.batches.push(batch);
        Ok(())
    }

    pub fn add_claim(&self, claim: SeparateClaim) -> RepositoryResult<()> {
        let mut guard = self
            .accounts
            .write()
            .map_err(|_| RepositoryError::Backend("accounts lock poisoned".to_string()))?;
        let record = guard
            .get_mut(claim.account())
            .ok_or_else(|| RepositoryError::NotFound(format!("account {}", claim.account())))?;
        record.claims.push(claim);
        Ok(())
    }

    pub fn outcomes(&self) -> RepositoryResult<Vec<StoredOutcome>> {
        let guard = self
            .outcomes
            .read()
            .map_err(|_| RepositoryError::Backend("outcomes lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn with_account<T>(
        &self,
        id: &AccountId,
        f: impl FnOnce(&AccountRecord) -> T,
    ) -> RepositoryResult<T> {
        let guard = self
            .accounts
            .read()
            .map_err(|_| RepositoryError::Backend("accounts lock poisoned".to_string()))?;
        guard
            .get(id)
            .map(f)
            .ok_or_else(|| RepositoryError::NotFound(format!("account {}", id)))
    }
}

impl CaseRepository for InMemoryCaseRepository {
    fn accounts(&self) -> RepositoryResult<Vec<AccountProfile>> {
        let guard = self
            .accounts
            .read()
            .map_err(|_| RepositoryError::Backend("accounts lock poisoned".to_string()))?;
        Ok(guard.values().map(|r| r.profile.clone()).collect())
    }

    fn account(&self, id: &AccountId) -> RepositoryResult<AccountProfile> {
        self.with_account(id, |r| r.profile.clone())
    }

    fn batches(&self, account: &AccountId) -> RepositoryResult<Vec<StatementBatch>> {
        self.with_account(account, |r| r.batches.clone())
    }

    fn claims(&self, account: &AccountId) -> RepositoryResult<Vec<SeparateClaim>> {
        self.with_account(account, |r| r.claims.clone())
    }

    fn store_outcome(&self, outcome: StoredOutcome) -> RepositoryResult<()> {
        let mut guard = self
            .outcomes
            .write()
            .map_err(|_| RepositoryError::Backend("outcomes lock poisoned".to_string()))?;
        guard.push(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::BatchId;
    use crate::core::currency::Money;
    use crate::core::period::DateRange;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_unknown_account_is_not_found() {
        let repo = InMemoryCaseRepository::new();
        assert!(matches!(
            repo.batches(&AccountId::new("X")),
            Err(RepositoryError::NotFound(_))
        ));
        let batch = StatementBatch::new(
            BatchId::from_u128(1),
            AccountId::new("X"),
            "USD",
            DateRange::single(day()),
        );
        assert!(matches!(repo.add_batch(batch), Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_account_conflicts() {
        let repo = InMemoryCaseRepository::new();
        repo.insert_account(AccountProfile::new(AccountId::new("A"), "USD")).unwrap();
        assert!(matches!(
            repo.insert_account(AccountProfile::new(AccountId::new("A"), "USD")),
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn test_round_trip_inputs() {
        let repo = InMemoryCaseRepository::new();
        repo.insert_account(AccountProfile::new(AccountId::new("B"), "USD").with_name("Savings"))
            .unwrap();
        repo.insert_account(AccountProfile::new(AccountId::new("A"), "USD")).unwrap();
        let claim = SeparateClaim::new(
            ClaimId::from_u128(1),
            AccountId::new("A"),
            Money::new(dec!(100), "USD"),
            day(),
        )
        .unwrap();
        repo.add_claim(claim.clone()).unwrap();

        let ids: Vec<AccountId> = repo.accounts().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![AccountId::new("A"), AccountId::new("B")]);
        assert_eq!(repo.claims(&AccountId::new("A")).unwrap(), vec![claim]);
        assert_eq!(repo.account(&AccountId::new("B")).unwrap().name.as_deref(), Some("Savings"));
    }
}
