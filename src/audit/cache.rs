use crate::audit::provenance::{provenance_hash, ContentHash, CLAIM_DOMAIN};
use crate::core::claim::SeparateClaim;
use crate::ledger::entry::Ledger;
use crate::trace::engine::TraceEngine;
use crate::trace::result::TraceResult;
use crate::trace::TraceError;
use log::debug;
use std::collections::HashMap;

/// Trace results keyed by the provenance hash of their inputs.
///
/// The key is always recomputed from the ledger and claim handed in, so a
/// changed transaction set or claim can only ever miss. Failed traces are
/// not stored.
#[derive(Debug, Default)]
pub struct TraceCache {
    entries: HashMap<ContentHash, TraceResult>,
    hits: u64,
    misses: u64,
}

impl TraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(ledger: &Ledger, claim: &SeparateClaim) -> Result<ContentHash, TraceError> {
        let claim_hash = ContentHash::of(CLAIM_DOMAIN, claim)?;
        Ok(provenance_hash(ledger.content_hash(), &claim_hash))
    }

    pub fn get_or_trace(
        &mut self,
        ledger: &Ledger,
        claim: &SeparateClaim,
    ) -> Result<TraceResult, TraceError> {
        let key = Self::key(ledger, claim)?;
        if let Some(result) = self.entries.get(&key) {
            self.hits += 1;
            debug!("trace cache hit {} for claim {}", key.short(), claim.id());
            return Ok(result.clone());
        }

        self.misses += 1;
        debug!("trace cache miss {} for claim {}", key.short(), claim.id());
        let result = TraceEngine::trace(ledger, claim)?;
        self.entries.insert(key, result.clone());
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
