use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one financial account under analysis.
///
/// The trace engine works on one account at a time; every record, batch
/// and claim names the account it belongs to and the builder rejects
/// anything addressed to a different one.
///
/// # Examples
///
/// ```
/// use libr_trace::core::account::AccountId;
///
/// let checking = AccountId::new("CHASE-CHK-4821");
/// let savings = AccountId::new("CHASE-SAV-1130");
/// assert_ne!(checking, savings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier.
    ///
    /// Convention: institution prefix, account kind and the last four
    /// digits of the account number (e.g., "CHASE-CHK-4821").
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this account ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
