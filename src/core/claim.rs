use crate::core::account::AccountId;
use crate::core::currency::{CurrencyCode, Money, MoneyError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(Uuid);

impl ClaimId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn from_u128(v: u128) -> Self {
        Self(Uuid::from_u128(v))
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the separate property came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimSource {
    Inheritance,
    Gift,
    Premarital,
    PersonalInjury,
    TrustDistribution,
    #[default]
    Other,
}

impl fmt::Display for ClaimSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClaimSource::Inheritance => "Inheritance",
            ClaimSource::Gift => "Gift",
            ClaimSource::Premarital => "Pre-marital asset",
            ClaimSource::PersonalInjury => "Personal injury settlement",
            ClaimSource::TrustDistribution => "Trust distribution",
            ClaimSource::Other => "Other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("claimed amount must not be negative, got {0}")]
    NegativeAmount(Money),
    #[error("anchor balance currency differs from claim: {0}")]
    AnchorCurrency(#[from] MoneyError),
}

/// A claim that `claimed_amount` of the account's funds is separate
/// property as of `claim_date`.
///
/// `anchor_balance` is the account balance immediately preceding the
/// claim. It is only consulted when the claim date falls before the first
/// ledger entry, where the ledger itself cannot say what the account held.
///
/// # Examples
///
/// ```
/// use libr_trace::core::claim::{ClaimId, SeparateClaim};
/// use libr_trace::core::account::AccountId;
/// use libr_trace::core::currency::Money;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let claim = SeparateClaim::new(
///     ClaimId::from_u128(1),
///     AccountId::new("CHASE-CHK-4821"),
///     Money::new(dec!(10000), "USD"),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(claim.claimed_amount().amount(), dec!(10000));
///
/// let negative = SeparateClaim::new(
///     ClaimId::from_u128(2),
///     AccountId::new("CHASE-CHK-4821"),
///     Money::new(dec!(-1), "USD"),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// );
/// assert!(negative.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparateClaim {
    id: ClaimId,
    account: AccountId,
    claimed_amount: Money,
    claim_date: NaiveDate,
    anchor_balance: Option<Money>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    source: ClaimSource,
}

impl SeparateClaim {
    pub fn new(
        id: ClaimId,
        account: AccountId,
        claimed_amount: Money,
        claim_date: NaiveDate,
    ) -> Result<Self, ClaimError> {
        if claimed_amount.is_negative() {
            return Err(ClaimError::NegativeAmount(claimed_amount));
        }
        Ok(Self {
            id,
            account,
            claimed_amount,
            claim_date,
            anchor_balance: None,
            name: None,
            source: ClaimSource::Other,
        })
    }

    /// Attach the balance immediately preceding the claim date.
    pub fn with_anchor_balance(mut self, balance: Money) -> Result<Self, ClaimError> {
        balance.ensure_same_currency(self.claimed_amount.currency())?;
        self.anchor_balance = Some(balance);
        Ok(self)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_source(mut self, source: ClaimSource) -> Self {
        self.source = source;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> ClaimId {
        self.id
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn claimed_amount(&self) -> &Money {
        &self.claimed_amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        self.claimed_amount.currency()
    }

    pub fn claim_date(&self) -> NaiveDate {
        self.claim_date
    }

    pub fn anchor_balance(&self) -> Option<&Money> {
        self.anchor_balance.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> ClaimSource {
        self.source
    }

    /// Re-run the constructor checks on a claim that arrived through
    /// deserialization.
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.claimed_amount.amount() < Decimal::ZERO {
            return Err(ClaimError::NegativeAmount(self.claimed_amount.clone()));
        }
        if let Some(anchor) = &self.anchor_balance {
            anchor.ensure_same_currency(self.claimed_amount.currency())?;
        }
        Ok(())
    }
}
