//! Tunable policies for ledger construction.
//!
//! Every knob has a documented default so that two runs with the default
//! configuration are comparable. A non-default configuration is part of
//! the computation's inputs and is folded into the ledger content hash
//! through its effects on the entries.

use crate::core::period::DateRange;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("similarity threshold must be within [0, 1], got {0}")]
    SimilarityThreshold(f64),
    #[error("balance tolerance must not be negative, got {0}")]
    NegativeTolerance(Decimal),
}

/// How to order same-day entries whose order the stated balances do not
/// settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameDayPolicy {
    /// Debits before credits: yields the lowest possible intra-day
    /// balance, resolving ambiguity against the claimant.
    #[default]
    Conservative,
    /// Keep statement order (batch, then sequence within the batch).
    SourceOrder,
}

/// Configuration for the ledger builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Minimum description similarity (Sørensen–Dice over bigrams) for two
    /// records to be considered the same transaction.
    pub similarity_threshold: f64,
    /// Allowed difference between a stated balance and the one implied by
    /// the previous stated balance plus intervening amounts.
    pub balance_tolerance: Decimal,
    /// Ordering policy for ambiguous same-day entries.
    pub same_day_policy: SameDayPolicy,
    /// Balance before the first entry. Derived from the first stated
    /// balance when absent.
    pub opening_balance: Option<Decimal>,
    /// Period that must be covered by statements. Defaults to the span of
    /// the declared batch coverage.
    pub analysis_window: Option<DateRange>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            balance_tolerance: dec!(0.01),
            same_day_policy: SameDayPolicy::Conservative,
            opening_balance: None,
            analysis_window: None,
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::SimilarityThreshold(self.similarity_threshold));
        }
        if self.balance_tolerance < Decimal::ZERO {
            return Err(ConfigError::NegativeTolerance(self.balance_tolerance));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TraceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TraceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.same_day_policy, SameDayPolicy::Conservative);
        assert_eq!(config.balance_tolerance, dec!(0.01));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = TraceConfig::from_json(r#"{ "same_day_policy": "source_order" }"#).unwrap();
        assert_eq!(config.same_day_policy, SameDayPolicy::SourceOrder);
        assert_eq!(config.similarity_threshold, 0.85);
        assert!(config.opening_balance.is_none());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = TraceConfig::from_json(r#"{ "similarity_threshold": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::SimilarityThreshold(_)));
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let err = TraceConfig::from_json(r#"{ "balance_tolerance": "-0.5" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeTolerance(_)));
    }
}
