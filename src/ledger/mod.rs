//! Canonical per-account ledger construction.
//!
//! Statement batches go in; one ordered, deduplicated, reconciled
//! [`Ledger`](entry::Ledger) comes out, together with every inconsistency
//! found on the way as a [`Discrepancy`](discrepancy::Discrepancy).

pub mod builder;
pub mod coverage;
pub mod dedup;
pub mod discrepancy;
pub mod entry;
pub mod ordering;

use crate::config::ConfigError;
use crate::core::account::AccountId;
use crate::core::batch::BatchId;
use crate::core::currency::CurrencyCode;
use crate::core::record::RecordId;
use entry::EntryRef;
use thiserror::Error;

/// Input that cannot be turned into a ledger at all.
///
/// These abort construction of this one ledger only.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("batch {batch} belongs to account {found}, expected {expected}")]
    BatchAccount {
        batch: BatchId,
        expected: AccountId,
        found: AccountId,
    },
    #[error("batch {batch} was supplied more than once")]
    DuplicateBatch { batch: BatchId },
    #[error("record {record} belongs to account {found}, expected {expected}")]
    RecordAccount {
        record: RecordId,
        expected: AccountId,
        found: AccountId,
    },
    #[error("record {record} claims batch {claimed} but was delivered in {batch}")]
    RecordBatch {
        record: RecordId,
        claimed: BatchId,
        batch: BatchId,
    },
    #[error("record {record} is denominated in {found}, ledger currency is {expected}")]
    Currency {
        record: RecordId,
        expected: CurrencyCode,
        found: CurrencyCode,
    },
    #[error("batch {batch} is denominated in {found}, ledger currency is {expected}")]
    BatchCurrency {
        batch: BatchId,
        expected: CurrencyCode,
        found: CurrencyCode,
    },
    #[error("record id {record} appears more than once")]
    DuplicateRecord { record: RecordId },
    #[error("ledger entries out of order: {previous} followed by {next}")]
    Unordered { previous: EntryRef, next: EntryRef },
    #[error("failed to hash ledger content: {0}")]
    Serialization(#[from] serde_json::Error),
}
