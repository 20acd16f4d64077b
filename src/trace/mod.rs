//! LIBR replay of a ledger against a separate-property claim, and the
//! presentation aggregates derived from the result.

pub mod engine;
pub mod result;
pub mod summary;

use crate::core::account::AccountId;
use crate::core::claim::{ClaimError, ClaimId};
use crate::core::currency::CurrencyCode;
use chrono::NaiveDate;
use thiserror::Error;

/// Why a claim cannot be traced against a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidClaimReason {
    #[error("claim date precedes the first ledger entry ({first_entry}) and no anchor balance was supplied")]
    Unanchored { first_entry: NaiveDate },
    #[error("ledger has no entries and no anchor balance was supplied")]
    NoLedgerData,
    #[error("ledger belongs to account {ledger}")]
    AccountMismatch { ledger: AccountId },
    #[error("claim is denominated in {claim}, ledger in {ledger}")]
    CurrencyMismatch {
        claim: CurrencyCode,
        ledger: CurrencyCode,
    },
    #[error(transparent)]
    Claim(#[from] ClaimError),
}

/// Failure of a single claim's computation. Never affects other claims.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("invalid claim {claim} on account {account} dated {claim_date}: {reason}")]
    InvalidClaim {
        claim: ClaimId,
        account: AccountId,
        claim_date: NaiveDate,
        reason: InvalidClaimReason,
    },
    #[error("failed to hash claim: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TraceError {
    pub fn is_invalid_claim(&self) -> bool {
        matches!(self, TraceError::InvalidClaim { .. })
    }
}
