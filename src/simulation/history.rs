//! Seeded random statement histories.
//!
//! Used by tests, benchmarks and the `generate` CLI command. The same
//! configuration always produces the same batches.

use crate::core::account::AccountId;
use crate::core::batch::{BatchId, StatementBatch};
use crate::core::currency::CurrencyCode;
use crate::core::period::DateRange;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

const DEBITS: &[&str] = &[
    "GROCERY OUTLET",
    "MORTGAGE PAYMENT",
    "ELECTRIC COMPANY",
    "CAR INSURANCE",
    "ATM WITHDRAWAL",
    "RESTAURANT",
    "ONLINE TRANSFER OUT",
];

const CREDITS: &[&str] = &["PAYROLL DEPOSIT", "MOBILE CHECK DEPOSIT", "TRANSFER FROM SAVINGS"];

/// Shape of a generated account history.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub account: AccountId,
    pub currency: CurrencyCode,
    pub start: NaiveDate,
    /// Number of calendar days covered.
    pub days: u32,
    /// Balance before the first generated transaction.
    pub opening_balance: Decimal,
    /// Upper bound on transactions per day; each day draws `0..=max`.
    pub max_transactions_per_day: u32,
    pub min_amount_cents: i64,
    pub max_amount_cents: i64,
    /// Chance that a transaction is a deposit.
    pub deposit_probability: f64,
    /// Length of each statement's coverage period.
    pub statement_days: u32,
    /// Print running balances on every record.
    pub with_stated_balances: bool,
    pub seed: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            account: AccountId::new("SIM-CHK-0001"),
            currency: CurrencyCode::new("USD"),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            days: 365,
            opening_balance: Decimal::from(25_000),
            max_transactions_per_day: 3,
            min_amount_cents: 500,
            max_amount_cents: 250_000,
            deposit_probability: 0.3,
            statement_days: 30,
            with_stated_balances: true,
            seed: 42,
        }
    }
}

/// Generate consecutive, non-overlapping statement batches covering
/// `config.days` days from `config.start`.
pub fn generate_history(config: &HistoryConfig) -> Vec<StatementBatch> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut batches = Vec::new();
    let mut balance = config.opening_balance;
    let statement_days = config.statement_days.max(1);
    let (low, high) = if config.min_amount_cents <= config.max_amount_cents {
        (config.min_amount_cents, config.max_amount_cents)
    } else {
        (config.max_amount_cents, config.min_amount_cents)
    };

    let mut offset = 0u32;
    while offset < config.days {
        let length = statement_days.min(config.days - offset);
        let from = config.start + Duration::days(i64::from(offset));
        let to = from + Duration::days(i64::from(length) - 1);
        let Ok(coverage) = DateRange::new(from, to) else {
            break;
        };

        let mut batch = StatementBatch::new(
            BatchId::from_u128(rng.gen()),
            config.account.clone(),
            config.currency.clone(),
            coverage,
        );

        for day in 0..length {
            let date = from + Duration::days(i64::from(day));
            for _ in 0..rng.gen_range(0..=config.max_transactions_per_day) {
                let cents = rng.gen_range(low..=high);
                let deposit = rng.gen_bool(config.deposit_probability.clamp(0.0, 1.0));
                let (amount, description) = if deposit {
                    (Decimal::new(cents, 2), CREDITS[rng.gen_range(0..CREDITS.len())])
                } else {
                    (Decimal::new(-cents, 2), DEBITS[rng.gen_range(0..DEBITS.len())])
                };
                balance += amount;

                let mut record = batch.record(date, amount).with_description(description);
                if config.with_stated_balances {
                    record = record.with_stated_balance(balance);
                }
                batch.add(record);
            }
        }

        batches.push(batch);
        offset += length;
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::builder::LedgerBuilder;

    #[test]
    fn test_same_seed_same_history() {
        let config = HistoryConfig {
            days: 60,
            ..Default::default()
        };
        assert_eq!(generate_history(&config), generate_history(&config));

        let other = HistoryConfig { seed: 7, ..config.clone() };
        assert_ne!(generate_history(&config), generate_history(&other));
    }

    #[test]
    fn test_statements_tile_the_period() {
        let config = HistoryConfig {
            days: 95,
            statement_days: 30,
            ..Default::default()
        };
        let batches = generate_history(&config);
        assert_eq!(batches.len(), 4);
        let total_days: i64 = batches.iter().map(|b| b.coverage().days()).sum();
        assert_eq!(total_days, 95);
        for pair in batches.windows(2) {
            assert_eq!(pair[0].coverage().end().succ_opt(), Some(pair[1].coverage().start()));
        }
    }

    #[test]
    fn test_generated_history_builds_cleanly() {
        let config = HistoryConfig {
            days: 120,
            ..Default::default()
        };
        let mut builder = LedgerBuilder::new(config.account.clone(), config.currency.clone());
        builder.add_batches(generate_history(&config));
        let ledger = builder.build().unwrap();
        assert!(ledger.discrepancies().is_empty());
        assert_eq!(ledger.opening_balance(), config.opening_balance);
    }
}
