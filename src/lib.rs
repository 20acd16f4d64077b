//! # libr-trace
//!
//! Forensic tracing of separate property through a commingled bank
//! account under the Lowest Intermediate Balance Rule (LIBR).
//!
//! Given the statements of one account and a claim that part of its funds
//! is separate property, the engine builds one canonical ledger, replays
//! it from the claim date, and reports how much of the claim remains
//! traceable along with every event that reduced it.
//!
//! ## Architecture
//!
//! - **core**: Value types: money, accounts, statement batches, records, claims
//! - **config**: Ledger construction policies
//! - **ledger**: Deduplication, same-day ordering, reconciliation, coverage gaps
//! - **trace**: LIBR replay, trace results and report summaries
//! - **audit**: Content hashing for provenance, hash-keyed result cache
//! - **case**: Repository boundary and multi-account runner
//! - **simulation**: Seeded statement-history generation

pub mod audit;
pub mod case;
pub mod config;
pub mod core;
pub mod ledger;
pub mod simulation;
pub mod trace;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::audit::cache::TraceCache;
    pub use crate::audit::provenance::ContentHash;
    pub use crate::case::repository::{AccountProfile, CaseRepository, InMemoryCaseRepository};
    pub use crate::case::runner::CaseRunner;
    pub use crate::config::{SameDayPolicy, TraceConfig};
    pub use crate::core::account::AccountId;
    pub use crate::core::batch::{BatchId, Confidence, StatementBatch};
    pub use crate::core::claim::{ClaimId, ClaimSource, SeparateClaim};
    pub use crate::core::currency::{CurrencyCode, Money};
    pub use crate::core::period::DateRange;
    pub use crate::core::record::{RecordId, TransactionRecord};
    pub use crate::ledger::builder::LedgerBuilder;
    pub use crate::ledger::discrepancy::{Discrepancy, DiscrepancyKind, Severity};
    pub use crate::ledger::entry::{Ledger, LedgerEntry};
    pub use crate::trace::engine::TraceEngine;
    pub use crate::trace::result::{TraceEvent, TraceResult};
    pub use crate::trace::summary::TraceSummary;
    pub use crate::trace::TraceError;
}
