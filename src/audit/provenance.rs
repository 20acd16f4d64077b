use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Lower-case hex SHA-256 digest of a value's canonical JSON encoding.
///
/// Every hash is domain-separated: the same bytes hashed as a ledger and
/// as a claim produce different digests.
///
/// # Examples
///
/// ```
/// use libr_trace::audit::provenance::ContentHash;
///
/// let a = ContentHash::of("example", &vec![1, 2, 3]).unwrap();
/// let b = ContentHash::of("example", &vec![1, 2, 3]).unwrap();
/// let c = ContentHash::of("other", &vec![1, 2, 3]).unwrap();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of<T: Serialize + ?Sized>(domain: &str, value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::digest(domain, &[&bytes]))
    }

    /// Hash of an ordered list of other hashes.
    pub fn combine(domain: &str, parts: &[&ContentHash]) -> Self {
        let parts: Vec<&[u8]> = parts.iter().map(|h| h.0.as_bytes()).collect();
        Self::digest(domain, &parts)
    }

    fn digest(domain: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        for part in parts {
            hasher.update([0u8]);
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines and console output.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const LEDGER_DOMAIN: &str = "libr-trace/ledger/v1";
pub const CLAIM_DOMAIN: &str = "libr-trace/claim/v1";
pub const PROVENANCE_DOMAIN: &str = "libr-trace/provenance/v1";

/// Provenance of one computation: binds a ledger to a claim.
pub fn provenance_hash(ledger: &ContentHash, claim: &ContentHash) -> ContentHash {
    ContentHash::combine(PROVENANCE_DOMAIN, &[ledger, claim])
}
